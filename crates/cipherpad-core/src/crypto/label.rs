//! Key labels.
//!
//! A label records how a key was produced so that blobs written today stay
//! decodable after defaults change. Labels travel as plain strings of the
//! form `<KIND>/<PARAMS>` and decoding never fails: anything unrecognized
//! becomes the default passphrase label, and the mismatch surfaces later as
//! an authentication failure instead of a parse error.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};

const PASSPHRASE_KIND: &str = "PASSPHRASE";
const BIOMETRIC_KIND: &str = "BIOMETRIC";

/// Digest used to turn a passphrase into key bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DigestAlgorithm {
    #[default]
    Sha512,
}

impl DigestAlgorithm {
    /// Every algorithm this build can decode.
    pub const ALL: &'static [DigestAlgorithm] = &[DigestAlgorithm::Sha512];

    /// Stable wire name used inside labels.
    pub fn name(self) -> &'static str {
        match self {
            DigestAlgorithm::Sha512 => "SHA_512",
        }
    }

    /// Look up an algorithm by its wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|alg| alg.name() == name)
    }

    /// Length of the digest output in bytes.
    pub fn output_len(self) -> usize {
        match self {
            DigestAlgorithm::Sha512 => 64,
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Describes how a key was derived.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Label {
    /// Key bytes are a digest of a passphrase.
    Passphrase { digest: DigestAlgorithm },
    /// Key bytes come from a platform-held secret gated by the device.
    Biometric { created_at: DateTime<Utc> },
}

impl Default for Label {
    fn default() -> Self {
        Label::Passphrase {
            digest: DigestAlgorithm::default(),
        }
    }
}

impl Label {
    /// Label for a platform secret created at `created_at`.
    pub fn biometric(created_at: DateTime<Utc>) -> Self {
        Label::Biometric { created_at }
    }

    /// The `<KIND>` half of the serialized form.
    pub fn kind(&self) -> &'static str {
        match self {
            Label::Passphrase { .. } => PASSPHRASE_KIND,
            Label::Biometric { .. } => BIOMETRIC_KIND,
        }
    }

    pub fn is_biometric(&self) -> bool {
        matches!(self, Label::Biometric { .. })
    }

    /// Decode a serialized label. Never fails; see the module docs.
    pub fn parse(value: &str) -> Label {
        let (kind, params) = match value.split_once('/') {
            Some((kind, params)) => (kind, Some(params)),
            None => (value, None),
        };

        match kind {
            PASSPHRASE_KIND => match params {
                None => Label::default(),
                Some(name) => match DigestAlgorithm::from_name(name) {
                    Some(digest) => Label::Passphrase { digest },
                    None => {
                        tracing::debug!(digest = name, "unknown digest in label, using default");
                        Label::default()
                    }
                },
            },
            BIOMETRIC_KIND => {
                let parsed = params.and_then(|ts| DateTime::parse_from_rfc3339(ts).ok());
                match parsed {
                    Some(ts) => Label::Biometric {
                        created_at: ts.with_timezone(&Utc),
                    },
                    None => {
                        tracing::debug!("unparseable biometric timestamp in label, using default");
                        Label::default()
                    }
                }
            }
            _ => {
                tracing::debug!(kind, "unknown label kind, using default passphrase label");
                Label::default()
            }
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Passphrase { digest } => write!(f, "{}/{}", PASSPHRASE_KIND, digest),
            Label::Biometric { created_at } => write!(
                f,
                "{}/{}",
                BIOMETRIC_KIND,
                created_at.to_rfc3339_opts(SecondsFormat::AutoSi, true)
            ),
        }
    }
}

impl FromStr for Label {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Label::parse(s))
    }
}
