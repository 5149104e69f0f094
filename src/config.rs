use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Local, NaiveDate, TimeZone};
use serde_derive::Deserialize;
use url::Url;

use crate::core::GenericResult;

pub const DEFAULT_PATH: &str = "zabbix-traffic.toml";

pub struct Config {
    pub server: ServerConfig,
    pub vlans: Vec<Vlan>,
    pub window: WindowSpec,
}

pub struct ServerConfig {
    pub url: Url,
    pub login: String,
    pub password: String,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Vlan {
    pub name: String,
    pub graph_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WindowSpec {
    Dates {from: NaiveDate, till: NaiveDate},
    LastHours(u64),
}

/// Report time window as Unix timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub time_from: i64,
    pub time_till: i64,
}

impl WindowSpec {
    pub fn resolve(&self) -> GenericResult<Window> {
        self.resolve_at(Local::now())
    }

    pub fn resolve_at(&self, now: DateTime<Local>) -> GenericResult<Window> {
        Ok(match *self {
            WindowSpec::Dates {from, till} => Window {
                time_from: local_midnight(from)?,
                time_till: local_midnight(till)?,
            },
            WindowSpec::LastHours(hours) => {
                let time_till = now.timestamp();
                let time_from = i64::try_from(hours).ok()
                    .and_then(|hours| hours.checked_mul(60 * 60))
                    .and_then(|seconds| time_till.checked_sub(seconds))
                    .ok_or("report.last_hours is too large")?;
                Window {time_from, time_till}
            },
        })
    }
}

fn local_midnight(date: NaiveDate) -> GenericResult<i64> {
    let midnight = date.and_hms_opt(0, 0, 0).ok_or("Invalid date")?;
    let time = Local.from_local_datetime(&midnight).earliest().ok_or_else(|| format!(
        "{date} has no local midnight"))?;
    Ok(time.timestamp())
}

impl Config {
    pub fn load(path: &Path) -> GenericResult<Config> {
        let data = fs::read_to_string(path).map_err(|e| format!(
            "Unable to read {path:?}: {e}"))?;

        Config::load_from_str(&data).map_err(|e| format!(
            "Error while reading {path:?} configuration file: {e}").into())
    }

    pub fn load_from_str(data: &str) -> GenericResult<Config> {
        let raw: RawConfig = toml::from_str(data)?;
        raw.validate()
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    server: RawServerConfig,
    vlans: BTreeMap<String, String>,
    report: RawReportConfig,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawServerConfig {
    url: String,
    login: String,
    password: String,
    timeout_secs: Option<u64>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawReportConfig {
    vlans: Vec<String>,
    from: Option<String>,
    till: Option<String>,
    last_hours: Option<u64>,
}

impl RawConfig {
    fn validate(self) -> GenericResult<Config> {
        let url = Url::parse(&self.server.url).map_err(|e| format!(
            "Invalid server.url: {e}"))?;

        if self.server.login.is_empty() {
            return Err!("server.login must be non-empty");
        }

        let timeout = match self.server.timeout_secs {
            Some(0) => return Err!("server.timeout_secs must be > 0"),
            Some(secs) => Some(Duration::from_secs(secs)),
            None => None,
        };

        if self.report.vlans.is_empty() {
            return Err!("report.vlans must be non-empty");
        }

        let mut vlans = Vec::with_capacity(self.report.vlans.len());
        for name in self.report.vlans {
            let Some(graph_id) = self.vlans.get(&name) else {
                return Err!("report.vlans: unknown VLAN {name:?}");
            };

            if graph_id.trim().is_empty() {
                return Err!("vlans.{name}: graph ID must be non-empty");
            }

            vlans.push(Vlan {
                name,
                graph_id: graph_id.trim().to_owned(),
            });
        }

        let window = match (self.report.from, self.report.till, self.report.last_hours) {
            (Some(from), Some(till), None) => {
                let from = parse_date("report.from", &from)?;
                let till = parse_date("report.till", &till)?;
                if from >= till {
                    return Err!("report.from must be earlier than report.till");
                }
                WindowSpec::Dates {from, till}
            },
            (None, None, Some(0)) => return Err!("report.last_hours must be > 0"),
            (None, None, Some(hours)) => WindowSpec::LastHours(hours),
            (None, None, None) => return Err!(
                "Report window is not set: specify report.from and report.till or report.last_hours"),
            (from, till, None) if from.is_none() || till.is_none() => return Err!(
                "report.from and report.till must be specified together"),
            _ => return Err!("report.from/report.till and report.last_hours are mutually exclusive"),
        };

        Ok(Config {
            server: ServerConfig {
                url,
                login: self.server.login,
                password: self.server.password,
                timeout,
            },
            vlans,
            window,
        })
    }
}

fn parse_date(name: &str, value: &str) -> GenericResult<NaiveDate> {
    Ok(NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| format!(
        "Invalid {name} ({value:?}): {e}"))?)
}
