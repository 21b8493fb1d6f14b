/// How the adapter and device are chosen.
#[derive(Debug, Clone)]
pub struct ComputeOptions {
    pub backends: wgpu::Backends,
    pub power_preference: wgpu::PowerPreference,
    pub force_fallback_adapter: bool,
    pub limits: wgpu::Limits,
    pub label: Option<&'static str>,
}

impl Default for ComputeOptions {
    fn default() -> Self {
        Self {
            backends: platform_backends(),
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            limits: wgpu::Limits::downlevel_defaults(),
            label: Some("field-kernel device"),
        }
    }
}

impl ComputeOptions {
    /// Defaults overridden by `WGPU_BACKEND` and `WGPU_POWER_PREF`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            backends: wgpu::util::backend_bits_from_env().unwrap_or(defaults.backends),
            power_preference: wgpu::util::power_preference_from_env()
                .unwrap_or(defaults.power_preference),
            ..defaults
        }
    }

    pub fn with_fallback_adapter(mut self, force: bool) -> Self {
        self.force_fallback_adapter = force;
        self
    }

    pub fn with_limits(mut self, limits: wgpu::Limits) -> Self {
        self.limits = limits;
        self
    }
}

fn platform_backends() -> wgpu::Backends {
    if cfg!(target_family = "wasm") {
        wgpu::Backends::BROWSER_WEBGPU
    } else if cfg!(windows) {
        wgpu::Backends::DX12
    } else if cfg!(target_vendor = "apple") {
        wgpu::Backends::METAL
    } else if cfg!(target_os = "linux") {
        wgpu::Backends::VULKAN | wgpu::Backends::GL
    } else {
        wgpu::Backends::all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_request_downlevel_limits() {
        let options = ComputeOptions::default();
        assert_eq!(
            options.limits.max_compute_invocations_per_workgroup,
            wgpu::Limits::downlevel_defaults().max_compute_invocations_per_workgroup
        );
        assert!(!options.force_fallback_adapter);
        assert!(!options.backends.is_empty());
    }
}
