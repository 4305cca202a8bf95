//! Path template translation.
//!
//! Event paths use `{name}` for a single segment and `{name+}` for the rest
//! of the path. Templates compile to the router's syntax: `{name}` and
//! `{*name}`.

use std::fmt;

/// One segment of a compiled path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Param(String),
    Greedy(String),
}

/// A malformed placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidTemplate {
    pub template: String,
    pub reason: &'static str,
}

/// A compiled route path, optionally prefixed by a stage segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Compile `template`, prefixing `stage` when set.
    pub fn compile(stage: Option<&str>, template: &str) -> Result<Self, InvalidTemplate> {
        let invalid = |reason| InvalidTemplate {
            template: template.to_string(),
            reason,
        };

        let mut segments = Vec::new();
        if let Some(stage) = stage {
            segments.extend(
                stage
                    .split('/')
                    .filter(|s| !s.is_empty())
                    .map(|s| Segment::Literal(s.to_string())),
            );
        }

        let raw: Vec<&str> = template.split('/').filter(|s| !s.is_empty()).collect();
        for (i, part) in raw.iter().enumerate() {
            let segment = match part.strip_prefix('{') {
                None if part.contains(['{', '}']) => {
                    return Err(invalid("placeholder must span a whole segment"))
                }
                None if part.starts_with([':', '*']) => {
                    return Err(invalid("segment starts with ':' or '*'; use {name} or {name+}"))
                }
                None => Segment::Literal(part.to_string()),
                Some(rest) => {
                    let name = rest
                        .strip_suffix('}')
                        .ok_or_else(|| invalid("unterminated placeholder"))?;
                    match name.strip_suffix('+') {
                        Some(name) => {
                            if i + 1 != raw.len() {
                                return Err(invalid("greedy placeholder must be last"));
                            }
                            Segment::Greedy(
                                valid_name(name).ok_or_else(|| invalid("invalid parameter name"))?,
                            )
                        }
                        None => Segment::Param(
                            valid_name(name).ok_or_else(|| invalid("invalid parameter name"))?,
                        ),
                    }
                }
            };
            segments.push(segment);
        }

        Ok(Self { segments })
    }

    /// Parameter names in positional order.
    pub fn param_names(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Param(name) | Segment::Greedy(name) => Some(name.as_str()),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    /// Router path, e.g. `/dev/users/{id}`.
    pub fn router_path(&self) -> String {
        if self.segments.is_empty() {
            return "/".to_string();
        }
        self.segments.iter().fold(String::new(), |mut acc, segment| {
            acc.push('/');
            match segment {
                Segment::Literal(s) => acc.push_str(s),
                Segment::Param(name) => acc.push_str(&format!("{{{}}}", name)),
                Segment::Greedy(name) => acc.push_str(&format!("{{*{}}}", name)),
            }
            acc
        })
    }

    /// True when the router cannot hold both patterns. Under a shared literal
    /// prefix, a parameter position must have the same name and kind in both.
    /// A literal beside a parameter is fine; the literal wins.
    pub fn conflicts_with(&self, other: &PathPattern) -> bool {
        for (a, b) in self.segments.iter().zip(&other.segments) {
            match (a, b) {
                (Segment::Literal(x), Segment::Literal(y)) if x == y => {}
                (Segment::Param(x), Segment::Param(y)) if x == y => {}
                (Segment::Greedy(x), Segment::Greedy(y)) => return x != y,
                (Segment::Param(_) | Segment::Greedy(_), Segment::Param(_) | Segment::Greedy(_)) => {
                    return true
                }
                _ => return false,
            }
        }
        false
    }
}

fn valid_name(name: &str) -> Option<String> {
    let name = name.trim();
    (!name.is_empty() && !name.contains(['{', '}', '*'])).then(|| name.to_string())
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.router_path())
    }
}

/// `/` + the raw event path, without stage. Used for display and as the
/// event's `resource`.
pub fn resource_path(template: &str) -> String {
    format!("/{}", template.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders_become_params() {
        let pattern = PathPattern::compile(None, "/{a}/b/{c}").unwrap();
        assert_eq!(pattern.router_path(), "/{a}/b/{c}");
        assert_eq!(pattern.param_names(), vec!["a", "c"]);
    }

    #[test]
    fn test_stage_prefix_keeps_params() {
        let plain = PathPattern::compile(None, "{a}/b/{c}").unwrap();
        let staged = PathPattern::compile(Some("dev"), "{a}/b/{c}").unwrap();
        assert_eq!(staged.router_path(), "/dev/{a}/b/{c}");
        assert_eq!(plain.param_names(), staged.param_names());
    }

    #[test]
    fn test_greedy_param() {
        let pattern = PathPattern::compile(None, "files/{proxy+}").unwrap();
        assert_eq!(pattern.router_path(), "/files/{*proxy}");
        assert_eq!(pattern.param_names(), vec!["proxy"]);
    }

    #[test]
    fn test_root_path() {
        assert_eq!(PathPattern::compile(None, "").unwrap().router_path(), "/");
        assert_eq!(PathPattern::compile(Some("dev"), "/").unwrap().router_path(), "/dev");
    }

    fn compiled(template: &str) -> PathPattern {
        PathPattern::compile(None, template).unwrap()
    }

    #[test]
    fn test_param_names_must_agree_per_position() {
        assert!(compiled("users/{id}").conflicts_with(&compiled("users/{userId}")));
        assert!(compiled("users/{id}/posts").conflicts_with(&compiled("users/{uid}/likes")));
        assert!(!compiled("users/{id}").conflicts_with(&compiled("users/{id}/posts")));
        assert!(!compiled("users/{id}").conflicts_with(&compiled("items/{key}")));
    }

    #[test]
    fn test_greedy_beside_param_conflicts() {
        assert!(compiled("items/{a}").conflicts_with(&compiled("items/{b+}")));
        assert!(compiled("items/{a+}").conflicts_with(&compiled("items/{a}")));
        assert!(compiled("files/{rest+}").conflicts_with(&compiled("files/{path+}")));
        assert!(!compiled("files/{rest+}").conflicts_with(&compiled("files/{rest+}")));
    }

    #[test]
    fn test_literal_beside_param_allowed() {
        assert!(!compiled("users/me").conflicts_with(&compiled("users/{id}")));
        assert!(!compiled("files/index").conflicts_with(&compiled("files/{rest+}")));
    }

    #[test]
    fn test_invalid_templates() {
        assert!(PathPattern::compile(None, "users/{id").is_err());
        assert!(PathPattern::compile(None, "users/x{id}").is_err());
        assert!(PathPattern::compile(None, "users/{}").is_err());
        assert!(PathPattern::compile(None, "{rest+}/tail").is_err());
        assert!(PathPattern::compile(None, "users/:id").is_err());
        assert!(PathPattern::compile(None, "files/*rest").is_err());
    }

    #[test]
    fn test_resource_path() {
        assert_eq!(resource_path("users/{id}"), "/users/{id}");
        assert_eq!(resource_path("/users"), "/users");
        assert_eq!(resource_path(""), "/");
    }
}
