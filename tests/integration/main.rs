//! HTTP integration tests.
//!
//! These run against a real PostgreSQL instance named by
//! `TEST_DATABASE_URL`; each test skips itself when the variable is
//! unset. Tests isolate themselves through freshly generated students
//! and lessons rather than wiping shared tables.

mod helpers;

mod code_test;
mod expiration_test;
mod grant_test;
mod progress_test;
