//! Entity states and templates.

mod definition;
mod template;

pub use definition::StateDefinition;
pub use template::{EntityTemplate, EventOutcome, TemplateBuilder};
