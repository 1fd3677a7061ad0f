//! Integration Tests Module
//!
//! End-to-end tests for the Story Forge workflow engine driven by scripted
//! backends and assessors. No network calls are made.

// Scripted backend and assessor doubles
mod support;

// Stage machine, enhancement loop, failures, streaming and history
mod workflow_test;


// Enhancement catalog selection and change descriptions
mod enhancement_test;
