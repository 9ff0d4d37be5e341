pub mod idt_pipeline;
pub mod logger;
