pub mod dependency_setup;
