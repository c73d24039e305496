//! Policies and the prefix table that assigns them to paths.
//!
//! A policy is a set of flags saying which kinds of change must be reported
//! for a path: `noadd`, `nomodify` and `nodelete`. `ignore` is the empty set
//! and `immutable` is the full set.
//!
//! The policy config is YAML:
//!
//! ```yaml
//! default-policy: immutable
//! policies:
//!   ./Pictures/: noadd,nodelete
//!   ./Downloads/: ignore
//! ```
//!
//! Both keys are optional and any other key is ignored.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

const TOKEN_IGNORE: &str = "ignore";
const TOKEN_IMMUTABLE: &str = "immutable";
const TOKEN_NOADD: &str = "noadd";
const TOKEN_NOMODIFY: &str = "nomodify";
const TOKEN_NODELETE: &str = "nodelete";

#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("bad policy token `{token}` in `{policy}`")]
    UnknownToken { policy: String, token: String },
    #[error("`{token}` cannot be combined with other tokens in `{policy}`")]
    ExclusiveToken { policy: String, token: &'static str },
    #[error("bad policy for `{prefix}`: {source}")]
    Rule {
        prefix: String,
        #[source]
        source: Box<PolicyError>,
    },
    #[error("bad default-policy: {0}")]
    Default(Box<PolicyError>),
    #[error("malformed `{key}`: {reason}")]
    Malformed {
        key: &'static str,
        reason: &'static str,
    },
}

/// One kind of change a policy can ask to be reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyFlag {
    NoAdd,
    NoModify,
    NoDelete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policy {
    noadd: bool,
    nomodify: bool,
    nodelete: bool,
}

impl Policy {
    pub const IGNORE: Policy = Policy {
        noadd: false,
        nomodify: false,
        nodelete: false,
    };

    pub const IMMUTABLE: Policy = Policy {
        noadd: true,
        nomodify: true,
        nodelete: true,
    };

    pub fn contains(&self, flag: PolicyFlag) -> bool {
        match flag {
            PolicyFlag::NoAdd => self.noadd,
            PolicyFlag::NoModify => self.nomodify,
            PolicyFlag::NoDelete => self.nodelete,
        }
    }

    fn with(mut self, flag: PolicyFlag) -> Self {
        match flag {
            PolicyFlag::NoAdd => self.noadd = true,
            PolicyFlag::NoModify => self.nomodify = true,
            PolicyFlag::NoDelete => self.nodelete = true,
        }
        self
    }
}

impl FromStr for Policy {
    type Err = PolicyError;

    /// Accepts `ignore`, `immutable`, or a comma separated combination of
    /// `noadd`, `nomodify` and `nodelete`.
    fn from_str(repr: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = repr.split(',').map(str::trim).collect();

        for exclusive in [TOKEN_IGNORE, TOKEN_IMMUTABLE] {
            if tokens.contains(&exclusive) {
                if tokens.len() > 1 {
                    return Err(PolicyError::ExclusiveToken {
                        policy: repr.to_string(),
                        token: exclusive,
                    });
                }
                return Ok(if exclusive == TOKEN_IGNORE {
                    Policy::IGNORE
                } else {
                    Policy::IMMUTABLE
                });
            }
        }

        tokens.into_iter().try_fold(Policy::IGNORE, |policy, token| {
            let flag = match token {
                TOKEN_NOADD => PolicyFlag::NoAdd,
                TOKEN_NOMODIFY => PolicyFlag::NoModify,
                TOKEN_NODELETE => PolicyFlag::NoDelete,
                _ => {
                    return Err(PolicyError::UnknownToken {
                        policy: repr.to_string(),
                        token: token.to_string(),
                    });
                }
            };
            Ok(policy.with(flag))
        })
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Policy::IGNORE {
            return f.write_str(TOKEN_IGNORE);
        }
        if *self == Policy::IMMUTABLE {
            return f.write_str(TOKEN_IMMUTABLE);
        }

        let tokens: Vec<&str> = [
            (self.noadd, TOKEN_NOADD),
            (self.nomodify, TOKEN_NOMODIFY),
            (self.nodelete, TOKEN_NODELETE),
        ]
        .into_iter()
        .filter_map(|(set, token)| set.then_some(token))
        .collect();
        f.write_str(&tokens.join(","))
    }
}

const KEY_DEFAULT_POLICY: &str = "default-policy";
const KEY_POLICIES: &str = "policies";

/// The policy config file as written by the user. Policy strings are kept
/// raw here and validated when the table is built.
#[derive(Debug, Default)]
pub struct PolicyConfig {
    default_policy: Option<String>,
    policies: Option<BTreeMap<String, String>>,
}

impl PolicyConfig {
    /// Parse a YAML policy config.
    ///
    /// Every document of the stream must be valid YAML, but only the first
    /// one is used. An empty document, or one that isn't a mapping, is a
    /// valid config without any settings. Keys other than `default-policy`
    /// and `policies` are skipped whatever their type.
    pub fn parse(content: &str) -> Result<Self, PolicyError> {
        let mut documents = Vec::new();
        for document in serde_yaml::Deserializer::from_str(content) {
            documents.push(serde_yaml::Value::deserialize(document)?);
        }

        let mapping = match documents.into_iter().next() {
            None | Some(serde_yaml::Value::Null) => return Ok(PolicyConfig::default()),
            Some(serde_yaml::Value::Mapping(mapping)) => mapping,
            Some(_) => {
                warn!("Policy config is not a mapping; using no settings from it");
                return Ok(PolicyConfig::default());
            }
        };

        let mut config = PolicyConfig::default();
        for (key, value) in mapping {
            let serde_yaml::Value::String(key) = key else {
                continue;
            };
            match key.as_str() {
                KEY_DEFAULT_POLICY => config.default_policy = Some(default_policy_value(value)?),
                KEY_POLICIES => config.policies = Some(policies_value(value)?),
                _ => {}
            }
        }

        Ok(config)
    }
}

fn default_policy_value(value: serde_yaml::Value) -> Result<String, PolicyError> {
    match value {
        serde_yaml::Value::String(repr) => Ok(repr),
        _ => Err(PolicyError::Malformed {
            key: KEY_DEFAULT_POLICY,
            reason: "expected a policy string",
        }),
    }
}

fn policies_value(value: serde_yaml::Value) -> Result<BTreeMap<String, String>, PolicyError> {
    let malformed = PolicyError::Malformed {
        key: KEY_POLICIES,
        reason: "expected a mapping of path prefixes to policy strings",
    };
    let serde_yaml::Value::Mapping(mapping) = value else {
        return Err(malformed);
    };

    let mut policies = BTreeMap::new();
    for (prefix, repr) in mapping {
        match (prefix, repr) {
            (serde_yaml::Value::String(prefix), serde_yaml::Value::String(repr)) => {
                policies.insert(prefix, repr);
            }
            _ => return Err(malformed),
        }
    }

    Ok(policies)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyRule {
    pub prefix: String,
    pub policy: Policy,
}

impl PolicyRule {
    /// Whether this rule governs `path`.
    ///
    /// The prefix must be a literal prefix of the path that also ends on a
    /// path segment boundary, so `./Documents` covers `./Documents/a` but not
    /// `./DocumentsX/a`.
    pub fn matches(&self, path: &str) -> bool {
        let Some(rest) = path.strip_prefix(self.prefix.as_str()) else {
            return false;
        };
        self.prefix.ends_with('/') || rest.is_empty() || rest.starts_with('/')
    }
}

#[derive(Debug, Clone)]
pub struct PolicyTable {
    default: Policy,
    /// Sorted by descending prefix length so the first match is the longest.
    rules: Vec<PolicyRule>,
}

impl PolicyTable {
    /// Build the table from a parsed config and an optional default policy
    /// override (from the command line).
    ///
    /// Every policy string in the config is validated, including a
    /// `default-policy` that the override shadows.
    pub fn build(
        config: &PolicyConfig,
        default_override: Option<&str>,
    ) -> Result<PolicyTable, PolicyError> {
        let default = resolve_default_policy(default_override, config.default_policy.as_deref())?;

        let mut rules = config
            .policies
            .iter()
            .flatten()
            .map(|(prefix, repr)| {
                let policy = repr.parse().map_err(|e| PolicyError::Rule {
                    prefix: prefix.clone(),
                    source: Box::new(e),
                })?;
                Ok(PolicyRule {
                    prefix: prefix.clone(),
                    policy,
                })
            })
            .collect::<Result<Vec<_>, PolicyError>>()?;

        // Prefixes are unique, so equal lengths never both match one path.
        // Ordering by the prefix itself only makes the table deterministic.
        rules.sort_by(|a, b| {
            b.prefix
                .len()
                .cmp(&a.prefix.len())
                .then_with(|| a.prefix.cmp(&b.prefix))
        });

        Ok(PolicyTable { default, rules })
    }

    /// The longest rule covering `path`, if any.
    pub fn matching_rule(&self, path: &str) -> Option<&PolicyRule> {
        self.rules.iter().find(|rule| rule.matches(path))
    }

    pub fn resolve(&self, path: &str) -> Policy {
        self.matching_rule(path)
            .map(|rule| rule.policy)
            .unwrap_or(self.default)
    }

    pub fn default_policy(&self) -> Policy {
        self.default
    }

    pub fn rules(&self) -> &[PolicyRule] {
        &self.rules
    }
}

/// Pick the default policy: the explicit override first, then the config
/// file's `default-policy`, then `immutable`.
pub fn resolve_default_policy(
    explicit: Option<&str>,
    from_config: Option<&str>,
) -> Result<Policy, PolicyError> {
    let parse = |repr: &str| {
        repr.parse::<Policy>()
            .map_err(|e| PolicyError::Default(Box::new(e)))
    };

    let from_config = from_config.map(parse).transpose()?;
    let explicit = explicit.map(parse).transpose()?;

    Ok(explicit.or(from_config).unwrap_or(Policy::IMMUTABLE))
}
