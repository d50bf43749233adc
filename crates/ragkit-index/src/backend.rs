use std::fmt;
use std::str::FromStr;

use ragkit_core::{Error, Result};
use ragkit_text::Bm25Params;

/// Ranking algorithm and constants an index is built with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backend {
    Bm25(Bm25Params),
}

impl Default for Backend {
    fn default() -> Self { Self::Bm25(Bm25Params::default()) }
}

impl Backend {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Bm25(_) => "bm25",
        }
    }

    /// Parse `bm25` or `bm25:k1=<f>,b=<f>`; omitted constants come from `defaults`.
    pub fn parse_with(spec: &str, defaults: Bm25Params) -> Result<Self> {
        let (name, args) = spec.trim().split_once(':').unwrap_or((spec.trim(), ""));
        if name != "bm25" { return Err(Error::Validation(format!("unknown backend '{name}' (expected bm25)"))); }
        let mut params = defaults;
        for pair in args.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (k, v) = pair.split_once('=').ok_or_else(|| Error::Validation(format!("backend argument '{pair}' must look like key=value")))?;
            let v: f64 = v.trim().parse().map_err(|_| Error::Validation(format!("backend argument '{pair}' is not a number")))?;
            match k.trim() {
                "k1" => params.k1 = v,
                "b" => params.b = v,
                other => return Err(Error::Validation(format!("unknown bm25 parameter '{other}'"))),
            }
        }
        params.validate()?;
        Ok(Self::Bm25(params))
    }

    pub fn bm25_params(&self) -> Bm25Params {
        match self {
            Self::Bm25(p) => *p,
        }
    }
}

impl FromStr for Backend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> { Self::parse_with(s, Bm25Params::default()) }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bm25(p) => write!(f, "bm25:k1={},b={}", p.k1, p.b),
        }
    }
}
