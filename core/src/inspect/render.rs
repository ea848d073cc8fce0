//! Bounded text rendering of [`Dynamic`] graphs.

use std::collections::HashSet;
use std::fmt::Write;

use serde::{Deserialize, Serialize};

use super::value::Dynamic;

/// Marker emitted where a container re-enters itself.
pub const CIRCULAR: &str = "<circular>";
/// Marker emitted for a container below the depth ceiling.
pub const DEPTH_LIMIT: &str = "<max depth>";
/// Marker emitted for a container locked for writing elsewhere.
pub const LOCKED: &str = "<locked>";
/// Marker appended to a clipped string or map key.
pub const CLIPPED: &str = "...";
/// Characters kept of a string or map key by [`inspect`].
pub const DEFAULT_MAX_STRING_LEN: usize = 256;

/// Output ceilings of the inspector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectorLimits {
    /// Containers nested deeper than this render as [`DEPTH_LIMIT`].
    pub max_depth: usize,
    /// Elements shown per container before truncating.
    pub max_items: usize,
    /// Characters shown of a string or map key before clipping.
    pub max_string_len: usize,
}

impl Default for InspectorLimits {
    fn default() -> Self {
        Self {
            max_depth: 6,
            max_items: 64,
            max_string_len: DEFAULT_MAX_STRING_LEN,
        }
    }
}

/// Render `value` as bounded, human-readable text.
///
/// Terminates on any graph: a container that is already being rendered
/// higher up the current path renders as [`CIRCULAR`]. Never fails; values
/// without a representation render as a typed placeholder. Strings and map
/// keys are clipped at [`DEFAULT_MAX_STRING_LEN`] characters.
pub fn inspect(value: &Dynamic, max_depth: usize, max_items: usize) -> String {
    inspect_with(
        value,
        InspectorLimits {
            max_depth,
            max_items,
            max_string_len: DEFAULT_MAX_STRING_LEN,
        },
    )
}

/// [`inspect`] with every ceiling taken from `limits`.
pub fn inspect_with(value: &Dynamic, limits: InspectorLimits) -> String {
    let mut renderer = Renderer {
        limits,
        visiting: HashSet::new(),
        out: String::new(),
    };
    renderer.value(value, 0);
    renderer.out
}

/// Split `s` after `max` characters. Returns the kept prefix and whether
/// anything was cut.
fn clip(s: &str, max: usize) -> (&str, bool) {
    match s.char_indices().nth(max) {
        Some((end, _)) => (&s[..end], true),
        None => (s, false),
    }
}

struct Renderer {
    limits: InspectorLimits,
    visiting: HashSet<usize>,
    out: String,
}

impl Renderer {
    fn value(&mut self, value: &Dynamic, depth: usize) {
        match value {
            Dynamic::Null => self.out.push_str("null"),
            Dynamic::Bool(b) => {
                let _ = write!(self.out, "{b}");
            }
            Dynamic::Int(i) => {
                let _ = write!(self.out, "{i}");
            }
            Dynamic::Float(f) => {
                let _ = write!(self.out, "{f:?}");
            }
            Dynamic::Str(s) => {
                let (kept, clipped) = clip(s, self.limits.max_string_len);
                let _ = write!(self.out, "{kept:?}");
                if clipped {
                    let _ = write!(self.out, "{CLIPPED}({} bytes)", s.len());
                }
            }
            Dynamic::Opaque(name) => {
                let _ = write!(self.out, "<unsupported {name}>");
            }
            Dynamic::List(_) | Dynamic::Map(_) => self.container(value, depth),
        }
    }

    fn container(&mut self, value: &Dynamic, depth: usize) {
        let Some(id) = value.identity() else {
            return;
        };
        if self.visiting.contains(&id) {
            self.out.push_str(CIRCULAR);
            return;
        }
        if depth >= self.limits.max_depth {
            self.out.push_str(DEPTH_LIMIT);
            return;
        }

        self.visiting.insert(id);
        match value {
            Dynamic::List(items) => match items.try_read_recursive() {
                Some(items) => {
                    self.out.push('[');
                    for (i, item) in items.iter().take(self.limits.max_items).enumerate() {
                        if i > 0 {
                            self.out.push_str(", ");
                        }
                        self.value(item, depth + 1);
                    }
                    self.truncation(items.len());
                    self.out.push(']');
                }
                None => self.out.push_str(LOCKED),
            },
            Dynamic::Map(entries) => match entries.try_read_recursive() {
                Some(entries) => {
                    self.out.push('{');
                    for (i, (key, item)) in entries.iter().take(self.limits.max_items).enumerate()
                    {
                        if i > 0 {
                            self.out.push_str(", ");
                        }
                        let (kept, clipped) = clip(key, self.limits.max_string_len);
                        self.out.push_str(kept);
                        if clipped {
                            self.out.push_str(CLIPPED);
                        }
                        self.out.push_str(": ");
                        self.value(item, depth + 1);
                    }
                    self.truncation(entries.len());
                    self.out.push('}');
                }
                None => self.out.push_str(LOCKED),
            },
            _ => {}
        }
        self.visiting.remove(&id);
    }

    fn truncation(&mut self, len: usize) {
        if len > self.limits.max_items {
            if self.limits.max_items > 0 {
                self.out.push_str(", ");
            }
            let _ = write!(self.out, "... {} more", len - self.limits.max_items);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(value: &Dynamic) -> String {
        let limits = InspectorLimits::default();
        inspect(value, limits.max_depth, limits.max_items)
    }

    #[test]
    fn scalars_and_nesting() {
        let map = Dynamic::map();
        map.insert("name", "cube");
        map.insert("visible", true);
        map.insert("count", 3);
        map.insert("scale", 1.5);
        map.insert("parent", Dynamic::Null);
        let list = Dynamic::list();
        list.push(1);
        list.push(2);
        map.insert("items", list);

        assert_eq!(
            render(&map),
            r#"{name: "cube", visible: true, count: 3, scale: 1.5, parent: null, items: [1, 2]}"#
        );
    }

    #[test]
    fn self_reference_emits_one_marker() {
        let obj = Dynamic::map();
        obj.insert("id", 1);
        obj.insert("self", obj.clone());

        let text = render(&obj);
        assert_eq!(text, "{id: 1, self: <circular>}");
        assert_eq!(text.matches(CIRCULAR).count(), 1);
        obj.clear();
    }

    #[test]
    fn indirect_cycle_is_detected() {
        let a = Dynamic::list();
        let b = Dynamic::list();
        a.push(b.clone());
        b.push(a.clone());

        assert_eq!(render(&a), "[[<circular>]]");
        a.clear();
    }

    #[test]
    fn shared_but_acyclic_values_render_twice() {
        let shared = Dynamic::list();
        shared.push("x");
        let root = Dynamic::list();
        root.push(shared.clone());
        root.push(shared);

        assert_eq!(render(&root), r#"[["x"], ["x"]]"#);
    }

    #[test]
    fn item_ceiling_truncates() {
        let list = Dynamic::list();
        for i in 0..10 {
            list.push(i);
        }
        assert_eq!(inspect(&list, 4, 3), "[0, 1, 2, ... 7 more]");
        assert_eq!(inspect(&list, 4, 0), "[... 10 more]");
    }

    #[test]
    fn depth_ceiling_truncates() {
        let root = Dynamic::list();
        let mut current = root.clone();
        for _ in 0..10 {
            let next = Dynamic::list();
            current.push(next.clone());
            current = next;
        }
        assert_eq!(inspect(&root, 2, 8), "[[<max depth>]]");
        assert_eq!(inspect(&root, 0, 8), DEPTH_LIMIT);
    }

    #[test]
    fn write_locked_container_renders_placeholder() {
        let list = Dynamic::list();
        list.push(1);
        let Dynamic::List(items) = &list else {
            unreachable!()
        };
        let _guard = items.write();
        assert_eq!(render(&list), LOCKED);
    }

    #[test]
    fn opaque_values_render_type_name() {
        let map = Dynamic::map();
        map.insert("handle", Dynamic::opaque::<std::fs::File>());
        assert_eq!(render(&map), "{handle: <unsupported std::fs::File>}");
    }

    #[test]
    fn long_strings_and_keys_are_clipped() {
        let limits = InspectorLimits {
            max_string_len: 4,
            ..InspectorLimits::default()
        };
        let map = Dynamic::map();
        map.insert("short", "abcd");
        map.insert("positions", "x".repeat(1_000_000));
        map.insert("unicode", "ééééé");

        let text = inspect_with(&map, limits);
        assert_eq!(
            text,
            r#"{shor...: "abcd", posi...: "xxxx"...(1000000 bytes), unic...: "éééé"...(10 bytes)}"#
        );
    }

    #[test]
    fn default_string_ceiling_bounds_output() {
        let huge = Dynamic::from("y".repeat(10_000_000));
        let text = render(&huge);
        assert!(text.len() < DEFAULT_MAX_STRING_LEN + 32, "{}", text.len());
        assert!(text.ends_with("...(10000000 bytes)"));
    }
}
