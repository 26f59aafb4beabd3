pub mod extractor_routine;
