/// Unit the backend should read `duration` in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DurationUnit {
    #[default]
    Seconds,
    Minutes,
}

impl DurationUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            DurationUnit::Seconds => "seconds",
            DurationUnit::Minutes => "minutes",
        }
    }
}

/// Flags forcing a specific downstream model provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Routing {
    pub force_replicate: bool,
    pub use_hunyuan: bool,
}

impl Default for Routing {
    fn default() -> Self {
        Self {
            force_replicate: true,
            use_hunyuan: false,
        }
    }
}

/// Parameters of one generation attempt. Built fresh per submission and
/// moved into the submit effect, so it cannot change once sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub duration: u32,
    pub duration_unit: DurationUnit,
    /// `(width, height)` in pixels.
    pub resolution: Option<(u32, u32)>,
    pub quality: String,
    pub style: String,
    pub human_focus: bool,
    pub model_id: Option<String>,
    pub routing: Routing,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            duration: 5,
            duration_unit: DurationUnit::Seconds,
            resolution: None,
            quality: "high".to_string(),
            style: "realistic".to_string(),
            human_focus: false,
            model_id: None,
            routing: Routing::default(),
        }
    }

    pub fn with_duration(mut self, duration: u32, unit: DurationUnit) -> Self {
        self.duration = duration;
        self.duration_unit = unit;
        self
    }

    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.resolution = Some((width, height));
        self
    }

    pub fn with_quality(mut self, quality: impl Into<String>) -> Self {
        self.quality = quality.into();
        self
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = style.into();
        self
    }

    pub fn with_human_focus(mut self, human_focus: bool) -> Self {
        self.human_focus = human_focus;
        self
    }

    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }

    pub fn with_routing(mut self, routing: Routing) -> Self {
        self.routing = routing;
        self
    }

    /// Trimmed prompt text as it is sent to the backend.
    pub fn trimmed_prompt(&self) -> &str {
        self.prompt.trim()
    }

    pub fn is_submittable(&self) -> bool {
        !self.trimmed_prompt().is_empty() && self.duration > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_prompt_or_zero_duration_is_not_submittable() {
        assert!(GenerationRequest::new("a lighthouse at dusk").is_submittable());
        assert!(!GenerationRequest::new("   \n").is_submittable());
        assert!(!GenerationRequest::new("ok")
            .with_duration(0, DurationUnit::Seconds)
            .is_submittable());
    }

    #[test]
    fn defaults_route_to_replicate() {
        let request = GenerationRequest::new("x");
        assert!(request.routing.force_replicate);
        assert!(!request.routing.use_hunyuan);
        assert_eq!(request.duration, 5);
        assert_eq!(request.quality, "high");
    }
}
