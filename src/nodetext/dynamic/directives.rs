//! Built-in directives
//!
//! | name           | phase | effect                                      |
//! |----------------|-------|---------------------------------------------|
//! | `FREEZE`       | 0     | halt; the target keeps its current text     |
//! | `INCLUDE`, `+` | 100   | add matching nodes                          |
//! | `EXCLUDE`, `-` | 105   | remove matching nodes                       |
//! | `SORT`         | 200   | stable multi-key sort                       |
//! | `LIMIT`        | 210   | keep the first N nodes                      |
//! | `FORMAT`       | 300   | render nodes through the show template      |
//! | `COUNT`        | 300   | render the number of selected nodes         |
//! | `TITLE`        | 700   | prefix a title line                         |

pub mod control;
pub mod limit;
pub mod output;
pub mod select;
pub mod sort;

pub use control::Freeze;
pub use limit::Limit;
pub use output::{Count, Format, Title};
pub use select::{Exclude, Include};
pub use sort::Sort;

#[cfg(test)]
pub(crate) mod testing {
    use crate::nodetext::config::Settings;
    use crate::nodetext::dynamic::{
        Accumulator, CompileContext, DirectiveRegistry, DynamicDefinition,
    };
    use crate::nodetext::parsing::{parse_with_defaults, Buffer};
    use std::path::Path;

    /// A parsed buffer plus a definition read from `parameters`, whose source is
    /// the node titled `source`.
    pub struct Fixture {
        pub buffer: Buffer,
        pub definition: DynamicDefinition,
        pub settings: Settings,
    }

    impl Fixture {
        pub fn new(text: &str, source: &str, parameters: &str) -> Self {
            let settings = Settings::default();
            let definition = DynamicDefinition::parse(
                parameters,
                parameters,
                source,
                0,
                &DirectiveRegistry::with_defaults(),
                &settings,
            )
            .expect("definition to parse");
            Fixture {
                buffer: parse_with_defaults(Path::new("fixture.txt"), text),
                definition,
                settings,
            }
        }

        pub fn context(&self) -> CompileContext<'_> {
            CompileContext::new(&self.buffer, &self.definition, &self.settings)
        }

        pub fn selecting(ids: &[&str]) -> Accumulator {
            Accumulator {
                nodes: ids.iter().map(|id| id.to_string()).collect(),
                text: None,
            }
        }
    }
}
