mod template;

pub use template::ActivityTemplate;
