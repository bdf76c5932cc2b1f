//! Scene-name composition
//!
//! Names are decorations only; identity always comes from UUID attributes.

/// Join prefix, base name and suffix with `_`, skipping empty parts
///
/// # Example
/// ```
/// use rig_framework_core_rs::core::naming::compose_name;
///
/// assert_eq!(compose_name(Some("L"), "arm", None), "L_arm");
/// assert_eq!(compose_name(Some(""), "arm", Some("proxy")), "arm_proxy");
/// ```
pub fn compose_name(prefix: Option<&str>, name: &str, suffix: Option<&str>) -> String {
    [prefix.unwrap_or(""), name, suffix.unwrap_or("")]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("_")
}

/// Combine a project-level prefix with a module prefix (`project_module`)
pub fn combine_prefix(project_prefix: Option<&str>, module_prefix: Option<&str>) -> Option<String> {
    let parts: Vec<&str> = [project_prefix, module_prefix]
        .into_iter()
        .flatten()
        .filter(|p| !p.is_empty())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("_"))
    }
}
