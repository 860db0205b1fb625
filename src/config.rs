use std::{fmt, fs::File, io::BufReader, path::{Path, PathBuf}, str::FromStr};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

/// Earliest storm season drawn on the storm-track figure.
pub const MIN_SEASON: i32 = 2000;

/// IBTrACS South Indian basin track lines, relative to the data directory.
pub const DEFAULT_TRACKS: &str = "IBTrACS.SI.list.v04r00.lines.zip";

/// The countries a report can be built for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Country {
    SouthAfrica,
    Mozambique,
}

impl Country {
    pub const ALL: [Country; 2] = [Country::SouthAfrica, Country::Mozambique];

    /// Selector accepted on the command line and in config files.
    pub fn slug(self) -> &'static str {
        match self {
            Country::SouthAfrica => "south-africa",
            Country::Mozambique => "mozambique",
        }
    }

    /// Static file layout and display settings for this country.
    pub fn profile(self) -> &'static CountryProfile {
        match self {
            Country::SouthAfrica => &SOUTH_AFRICA,
            Country::Mozambique => &MOZAMBIQUE,
        }
    }
}

impl FromStr for Country {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace(['_', ' '], "-").as_str() {
            "south-africa" | "zaf" => Ok(Country::SouthAfrica),
            "mozambique" | "moz" => Ok(Country::Mozambique),
            _ => bail!(
                "[config] unsupported country {s:?}, expected one of: {}",
                Country::ALL.map(Country::slug).join(", "),
            ),
        }
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.profile().name)
    }
}

/// Per-country inputs: file names under the data directory, map centre, and
/// boundary label corrections.
#[derive(Debug)]
pub struct CountryProfile {
    pub iso3: &'static str,
    pub name: &'static str,
    /// Buildings at or above 95% confidence.
    pub buildings: &'static str,
    /// Second-level administrative boundaries (`NAME_2` is the district).
    pub districts: &'static str,
    /// Zipped buildings at or above 90% confidence, with population estimates.
    pub superset: &'static str,
    /// Map centre as (lat, lon).
    pub center: (f64, f64),
    /// Exact-match label substitutions applied to the boundary attributes.
    pub name_fixes: &'static [(&'static str, &'static str)],
}

static SOUTH_AFRICA: CountryProfile = CountryProfile {
    iso3: "ZAF",
    name: "South Africa",
    buildings: "south_africa_95conf_W1_6.csv",
    districts: "ZAF_adm/ZAF_adm2.shp",
    superset: "southafrica_90conf_dom_height_all.csv.zip",
    center: (-30.5595, 22.9375),
    name_fixes: &[],
};

static MOZAMBIQUE: CountryProfile = CountryProfile {
    iso3: "MOZ",
    name: "Mozambique",
    buildings: "mozambique_95conf_W1_6.csv",
    districts: "MOZ_adm/MOZ_adm2.shp",
    superset: "mozambique_90conf_dom_height_all.csv.zip",
    center: (-18.6657, 35.5296),
    name_fixes: &[("Zambezia", "Zambézia"), ("Niassa", "Nassa")],
};

fn default_data_dir() -> PathBuf { PathBuf::from(".") }

fn default_min_season() -> i32 { MIN_SEASON }

/// Everything one report run depends on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    pub country: Country,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Track archive; defaults to `DEFAULT_TRACKS` inside `data_dir`.
    #[serde(default)]
    pub tracks: Option<PathBuf>,
    #[serde(default = "default_min_season")]
    pub min_season: i32,
}

impl ReportConfig {
    pub fn new(country: Country, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            country,
            data_dir: data_dir.into(),
            tracks: None,
            min_season: MIN_SEASON,
        }
    }

    /// Read a configuration from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("[config] Failed to open config file: {}", path.display()))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("[config] Invalid config file: {}", path.display()))
    }

    #[inline] pub fn profile(&self) -> &'static CountryProfile { self.country.profile() }

    /// Resolve a path relative to the data directory.
    #[inline] pub fn path(&self, rel: &str) -> PathBuf { self.data_dir.join(rel) }

    pub fn tracks_path(&self) -> PathBuf {
        self.tracks.clone().unwrap_or_else(|| self.path(DEFAULT_TRACKS))
    }
}
