//! Request Builder
//!
//! Builder for [`GenerationRequest`]:
//! 1. Create with `::new(genre, words)`
//! 2. Chain `.field(value)` calls
//! 3. Call `.build()` which validates and returns `CoreResult<GenerationRequest>`
//!
//! The length class is derived from the word count unless set explicitly.

use crate::error::CoreResult;
use crate::request::{Genre, GenerationRequest, LengthClass, DEFAULT_ENHANCEMENT_PASSES};

/// Builder for [`GenerationRequest`].
#[derive(Debug, Clone)]
pub struct GenerationRequestBuilder {
    genre: Genre,
    target_word_count: u32,
    length: Option<LengthClass>,
    theme: Option<String>,
    setting: Option<String>,
    quality_target: Option<f64>,
    max_enhancement_passes: u32,
    strict_success: bool,
}

impl GenerationRequestBuilder {
    pub fn new(genre: Genre, target_word_count: u32) -> Self {
        Self {
            genre,
            target_word_count,
            length: None,
            theme: None,
            setting: None,
            quality_target: None,
            max_enhancement_passes: DEFAULT_ENHANCEMENT_PASSES,
            strict_success: false,
        }
    }

    pub fn length(mut self, length: LengthClass) -> Self {
        self.length = Some(length);
        self
    }

    pub fn theme(mut self, theme: impl Into<String>) -> Self {
        self.theme = Some(theme.into());
        self
    }

    pub fn setting(mut self, setting: impl Into<String>) -> Self {
        self.setting = Some(setting.into());
        self
    }

    pub fn quality_target(mut self, target: f64) -> Self {
        self.quality_target = Some(target);
        self
    }

    pub fn max_enhancement_passes(mut self, passes: u32) -> Self {
        self.max_enhancement_passes = passes;
        self
    }

    pub fn strict_success(mut self, strict: bool) -> Self {
        self.strict_success = strict;
        self
    }

    /// Build and validate the request.
    pub fn build(self) -> CoreResult<GenerationRequest> {
        let request = self.build_unchecked();
        request.validate()?;
        Ok(request)
    }

    /// Build without validation. The workflow engine validates on entry, so
    /// callers that want the run to record the failure use this.
    pub fn build_unchecked(self) -> GenerationRequest {
        GenerationRequest {
            length: self
                .length
                .unwrap_or_else(|| LengthClass::for_word_count(self.target_word_count)),
            genre: self.genre,
            target_word_count: self.target_word_count,
            theme: self.theme,
            setting: self.setting,
            quality_target: self.quality_target,
            max_enhancement_passes: self.max_enhancement_passes,
            strict_success: self.strict_success,
        }
    }
}
