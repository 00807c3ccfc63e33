//! Backend selection
//!
//! A backend spec is `name[:key=value,...]`. Known backends: `uvc`
//! (hardware over the extension unit) and `dummy` (in-memory image, for
//! development and tests).

use camflash_core::channel::CommandChannel;
use camflash_dummy::{DummyConfig, DummyDevice};

/// Names of the available backends
pub fn backend_names() -> &'static str {
    if cfg!(feature = "uvc") {
        "uvc, dummy"
    } else {
        "dummy"
    }
}

/// Split a backend spec into its name and option pairs
fn parse_spec(spec: &str) -> Result<(&str, Vec<(&str, &str)>), String> {
    let (name, rest) = match spec.split_once(':') {
        Some((name, rest)) => (name, rest),
        None => (spec, ""),
    };

    let mut options = Vec::new();
    for pair in rest.split(',').filter(|p| !p.is_empty()) {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| format!("malformed option '{}', expected key=value", pair))?;
        options.push((key, value));
    }

    Ok((name, options))
}

/// Open the channel named by a backend spec
pub fn open_channel(
    spec: &str,
) -> Result<Box<dyn CommandChannel + Send>, Box<dyn std::error::Error>> {
    let (name, options) = parse_spec(spec)?;

    match name {
        "dummy" => {
            let mut image_path = None;
            for (key, value) in &options {
                match *key {
                    "image" => image_path = Some(*value),
                    _ => return Err(format!("unknown dummy option: {}", key).into()),
                }
            }

            let device = match image_path {
                Some(path) => {
                    let image = std::fs::read(path)?;
                    log::info!("dummy backend with {} byte image from {}", image.len(), path);
                    DummyDevice::with_image(DummyConfig::default(), &image)
                }
                None => DummyDevice::new_default(),
            };
            Ok(Box::new(device))
        }

        #[cfg(feature = "uvc")]
        "uvc" => {
            let config = camflash_uvc::parse_options(&options)?;
            let channel = camflash_uvc::UvcChannel::open_with_config(config)?;
            Ok(Box::new(channel))
        }

        _ => Err(format!("unknown backend '{}' (available: {})", name, backend_names()).into()),
    }
}
