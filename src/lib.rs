#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Getypeerd documentmodel voor scene-markup met een schema-gestuurde
//! XML-serializer.

pub mod elements;
pub mod geom;
pub mod parse;
pub mod resource;
pub mod scene;

pub use elements::ElementFactory;
pub use parse::{
    Markup, MarkupError, MarkupSerializer, SerializerOptions, Severity, Violation, ViolationKind,
    Written,
};
pub use scene::element::{Element, ElementKind, ElementTag};
pub use scene::id::{ElementId, IdGenerator};
pub use scene::value::{Value, ValueKind};
pub use scene::{ElementTree, TreeError};

cfg_if::cfg_if! {
    if #[cfg(feature = "debug_logs")] {
        /// Installeer `env_logger` met `debug` als standaardniveau.
        pub fn init_logger() {
            let _ = env_logger::Builder::from_env(
                env_logger::Env::default().default_filter_or("debug"),
            )
            .try_init();
        }
    } else {
        /// Zonder `debug_logs` doet dit niets.
        pub fn init_logger() {}
    }
}
