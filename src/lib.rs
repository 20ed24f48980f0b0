mod template;

pub use template::{render_docs, render_index};
