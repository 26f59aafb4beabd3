pub mod credential_file;
pub mod secure_delete;
