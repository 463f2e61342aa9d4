//! Encoder-list resolution.
//!
//! An encoder list is a `/`-separated sequence of entries. Each entry is
//! `name` or `name,level,level,...` where `name` is a codec or an alias.
//!
//! ```text
//! fast/zstd,1,19/lz4      alias, explicit levels, full level range
//! ```
//!
//! Bad entries never abort resolution: they are collected in
//! [`Resolution::errors`] and the remaining entries still resolve.

use tracing::{debug, warn};

use crate::error::BenchError;
use crate::registry::Registry;

/// One concrete unit of work: a codec at one level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationSpec {
    pub codec: String,
    /// Index into [`Registry::codecs`].
    pub index: usize,
    pub level: i32,
    pub param2: i32,
}

#[derive(Debug, Default)]
pub struct Resolution {
    pub specs: Vec<InvocationSpec>,
    pub errors: Vec<BenchError>,
}

/// Expand `list` against `registry`.
pub fn resolve(registry: &Registry, list: &str) -> Resolution {
    let mut out = Resolution::default();
    let mut stack = Vec::new();
    expand(registry, list, &mut stack, &mut out);
    for err in &out.errors {
        warn!("skipping encoder entry: {err}");
    }
    debug!(count = out.specs.len(), "resolved encoder list '{list}'");
    out
}

/// `stack` holds the aliases currently being substituted. It is empty at
/// top level, where a bare alias name shadows a codec of the same name; an
/// entry with explicit levels, or any entry inside an expansion, that names
/// a codec always means the codec.
fn expand(registry: &Registry, list: &str, stack: &mut Vec<String>, out: &mut Resolution) {
    for entry in list.split('/') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }

        let mut parts = entry.split(',').map(str::trim);
        let name = parts.next().unwrap_or_default();
        let raw_params: Vec<&str> = parts.collect();
        let params: Vec<&str> = raw_params.iter().copied().filter(|p| !p.is_empty()).collect();

        if name.is_empty() {
            out.errors.push(BenchError::MalformedSpec {
                entry: entry.to_string(),
                reason: "missing codec name".to_string(),
            });
            continue;
        }
        if params.is_empty() && !raw_params.is_empty() {
            out.errors.push(BenchError::MalformedSpec {
                entry: entry.to_string(),
                reason: "no level after ','".to_string(),
            });
            continue;
        }

        let nested = !stack.is_empty();
        let is_codec = registry.codec_index(name).is_some();

        if let Some(alias) = registry.alias(name) {
            if !(is_codec && (nested || !params.is_empty())) {
                if stack.iter().any(|s| s == name) {
                    out.errors.push(BenchError::AliasCycle(name.to_string()));
                    continue;
                }
                // Parameters on an alias are appended to every entry of its
                // expansion that names no parameters of its own.
                let expansion = if params.is_empty() {
                    alias.expansion.to_string()
                } else {
                    with_params(alias.expansion, &params)
                };
                stack.push(name.to_string());
                expand(registry, &expansion, stack, out);
                stack.pop();
                continue;
            }
        }

        let Some(index) = registry.codec_index(name) else {
            out.errors.push(BenchError::UnknownCodec(name.to_string()));
            continue;
        };
        let desc = registry.codec_at(index);
        let make = |level: i32| InvocationSpec {
            codec: desc.name.to_string(),
            index,
            level,
            param2: desc.additional_param,
        };

        if params.is_empty() {
            out.specs
                .extend((desc.first_level..=desc.last_level).map(make));
            continue;
        }

        for raw in params {
            let level: i64 = match raw.parse() {
                Ok(level) => level,
                Err(_) => {
                    out.errors.push(BenchError::MalformedSpec {
                        entry: entry.to_string(),
                        reason: format!("'{raw}' is not an integer level"),
                    });
                    continue;
                }
            };
            if !desc.accepts_level(level) {
                out.errors.push(BenchError::LevelOutOfRange {
                    codec: desc.name.to_string(),
                    level,
                    first: desc.first_level,
                    last: desc.last_level,
                });
                continue;
            }
            out.specs.push(make(level as i32));
        }
    }
}

fn with_params(expansion: &str, params: &[&str]) -> String {
    let suffix = params.join(",");
    expansion
        .split('/')
        .map(|entry| {
            if entry.contains(',') || entry.trim().is_empty() {
                entry.to_string()
            } else {
                format!("{entry},{suffix}")
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::codec::{Codec, CodecContext, CodecParams};
    use crate::registry::CodecDescriptor;

    struct Nop;

    impl Codec for Nop {
        fn compress(
            &self,
            _: &[u8],
            _: &mut [u8],
            _: CodecParams,
            _: Option<&mut CodecContext>,
        ) -> anyhow::Result<usize> {
            Ok(0)
        }

        fn decompress(
            &self,
            _: &[u8],
            _: &mut [u8],
            _: CodecParams,
            _: Option<&mut CodecContext>,
        ) -> anyhow::Result<usize> {
            Ok(0)
        }
    }

    fn registry() -> Registry {
        let mut reg = Registry::new();
        reg.register(CodecDescriptor::new("memcpy", "", (0, 0), Arc::new(Nop)))
            .register(CodecDescriptor::new("zz", "1", (1, 9), Arc::new(Nop)))
            .register(CodecDescriptor::new("zz24", "1", (1, 9), Arc::new(Nop)).with_param(24))
            .register(CodecDescriptor::new("lo", "2", (1, 3), Arc::new(Nop)))
            .register_alias("fast", "memcpy/zz,1,2")
            .register_alias("lo", "lo,1,3")
            .register_alias("group", "fast/lo")
            .register_alias("loop", "memcpy/loop")
            .register_alias("ping", "pong")
            .register_alias("pong", "ping");
        reg
    }

    fn pairs(res: &Resolution) -> Vec<(&str, i32)> {
        res.specs.iter().map(|s| (s.codec.as_str(), s.level)).collect()
    }

    #[test]
    fn raw_tokens_resolve_one_spec_each_in_order() {
        let res = resolve(&registry(), "zz,3/memcpy,0/zz,1/lo,2");
        assert!(res.errors.is_empty());
        assert_eq!(pairs(&res), vec![("zz", 3), ("memcpy", 0), ("zz", 1), ("lo", 2)]);
    }

    #[test]
    fn bare_name_uses_full_level_range() {
        let res = resolve(&registry(), "zz24");
        assert_eq!(res.specs.len(), 9);
        assert_eq!(res.specs[0].level, 1);
        assert_eq!(res.specs[8].level, 9);
        assert!(res.specs.iter().all(|s| s.param2 == 24));
    }

    #[test]
    fn out_of_range_level_is_rejected_per_value() {
        let res = resolve(&registry(), "zz,2,15,4/memcpy");
        assert_eq!(pairs(&res), vec![("zz", 2), ("zz", 4), ("memcpy", 0)]);
        assert_eq!(res.errors.len(), 1);
        assert!(matches!(
            res.errors[0],
            BenchError::LevelOutOfRange { level: 15, first: 1, last: 9, .. }
        ));
    }

    #[test]
    fn unknown_codec_is_skipped() {
        let res = resolve(&registry(), "nope/zz,5");
        assert_eq!(pairs(&res), vec![("zz", 5)]);
        assert!(matches!(&res.errors[0], BenchError::UnknownCodec(n) if n == "nope"));
    }

    #[test]
    fn alias_shadows_codec_at_top_level_only() {
        // "lo" is both; its expansion names the codec "lo", which must not
        // be expanded again.
        let res = resolve(&registry(), "lo");
        assert!(res.errors.is_empty());
        assert_eq!(pairs(&res), vec![("lo", 1), ("lo", 3)]);

        // Explicit levels select the codec directly.
        let res = resolve(&registry(), "lo,2");
        assert_eq!(pairs(&res), vec![("lo", 2)]);
    }

    #[test]
    fn nested_aliases_expand_once_per_occurrence() {
        let res = resolve(&registry(), "group/fast");
        assert!(res.errors.is_empty());
        assert_eq!(
            pairs(&res),
            vec![
                ("memcpy", 0),
                ("zz", 1),
                ("zz", 2),
                ("lo", 1),
                ("lo", 2),
                ("lo", 3),
                ("memcpy", 0),
                ("zz", 1),
                ("zz", 2),
            ]
        );
    }

    #[test]
    fn alias_cycles_are_config_errors() {
        let res = resolve(&registry(), "loop/ping/zz,9");
        assert_eq!(pairs(&res), vec![("memcpy", 0), ("zz", 9)]);
        assert_eq!(res.errors.len(), 2);
        assert!(res.errors.iter().all(|e| matches!(e, BenchError::AliasCycle(_))));
        assert!(res.errors.iter().all(BenchError::is_config));
    }

    #[test]
    fn malformed_entries_are_reported() {
        let res = resolve(&registry(), ",3/zz,x,2//");
        assert_eq!(pairs(&res), vec![("zz", 2)]);
        assert_eq!(res.errors.len(), 2);
        assert!(res
            .errors
            .iter()
            .all(|e| matches!(e, BenchError::MalformedSpec { .. })));
    }

    #[test]
    fn trailing_comma_without_levels_is_reported() {
        let res = resolve(&registry(), "zz,/memcpy/zz,,/fast,/zz,2,,3");
        assert_eq!(pairs(&res), vec![("memcpy", 0), ("zz", 2), ("zz", 3)]);
        assert_eq!(res.errors.len(), 3);
        assert!(res
            .errors
            .iter()
            .all(|e| matches!(e, BenchError::MalformedSpec { .. })));
    }

    #[test]
    fn alias_params_apply_to_bare_entries() {
        let res = resolve(&registry(), "fast,0");
        // memcpy takes level 0; zz keeps its own explicit levels.
        assert_eq!(pairs(&res), vec![("memcpy", 0), ("zz", 1), ("zz", 2)]);
    }
}
