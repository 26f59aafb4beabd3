pub mod cleanup_routine;
