//! Configuration validation.

use loadbridge_common::ConfigError;
use tracing_subscriber::filter::Directive;

use super::LoadBridgeConfig;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &LoadBridgeConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    let level = config.log.level.trim();
    if level.is_empty() {
        errors.push("log.level must not be empty".into());
    } else if level.contains(char::is_whitespace) {
        errors.push(format!("log.level '{level}' must not contain whitespace"));
    } else if let Err(e) = level.parse::<Directive>() {
        errors.push(format!("log.level '{level}' is not a valid filter directive: {e}"));
    }

    // An unset frame class is allowed; the JNI bridge refuses to start
    // without one.
    if !config.jni.frame_class.is_empty() {
        validate_class_name(&mut errors, "jni.frame_class", &config.jni.frame_class);
    }
    validate_class_name(
        &mut errors,
        "jni.transition_type_class",
        &config.jni.transition_type_class,
    );
    validate_class_name(&mut errors, "jni.error_code_class", &config.jni.error_code_class);

    let ctor = &config.jni.frame_constructor;
    if !(ctor.starts_with('(') && ctor.ends_with(")V")) {
        errors.push(format!(
            "jni.frame_constructor '{ctor}' is not a void method signature"
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

/// JVM internal class names: `/`-separated, no dots, no empty segments.
fn validate_class_name(errors: &mut Vec<String>, field: &str, name: &str) {
    if name.is_empty() {
        errors.push(format!("{field} must not be empty"));
        return;
    }
    if name.contains('.') {
        errors.push(format!(
            "{field} '{name}' must use '/' separators, not '.'"
        ));
    }
    if name.split('/').any(str::is_empty) {
        errors.push(format!("{field} '{name}' has an empty path segment"));
    }
}
