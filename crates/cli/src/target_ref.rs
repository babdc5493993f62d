use anyhow::{Context, Result};
use paneview_core::Target;

/// Resolve a target argument. Accepts `session:window`, a bare session name
/// (window 0), or a bare window index in the default session.
pub fn resolve_target(arg: Option<&str>, default_session: &str) -> Result<Target> {
    let Some(arg) = arg.map(str::trim).filter(|a| !a.is_empty()) else {
        return Ok(Target::new(default_session, 0));
    };
    if let Ok(window) = arg.parse::<u32>() {
        return Ok(Target::new(default_session, window));
    }
    arg.parse()
        .with_context(|| format!("Invalid target '{arg}' (expected session:window)"))
}

pub fn resolve_targets(args: &[String], default_session: &str) -> Result<Vec<Target>> {
    if args.is_empty() {
        return Ok(vec![resolve_target(None, default_session)?]);
    }
    let mut targets = Vec::with_capacity(args.len());
    for arg in args {
        let target = resolve_target(Some(arg), default_session)?;
        if !targets.contains(&target) {
            targets.push(target);
        }
    }
    Ok(targets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_all_forms() {
        assert_eq!(resolve_target(None, "mobile").unwrap(), Target::new("mobile", 0));
        assert_eq!(resolve_target(Some("3"), "mobile").unwrap(), Target::new("mobile", 3));
        assert_eq!(resolve_target(Some("work"), "mobile").unwrap(), Target::new("work", 0));
        assert_eq!(resolve_target(Some("work:2"), "mobile").unwrap(), Target::new("work", 2));
    }

    #[test]
    fn rejects_bad_window() {
        let err = resolve_target(Some("work:x"), "mobile").unwrap_err();
        assert!(format!("{err:#}").contains("Invalid target 'work:x'"));
    }

    #[test]
    fn deduplicates_targets() {
        let args = vec!["1".to_string(), "mobile:1".to_string(), "other".to_string()];
        assert_eq!(
            resolve_targets(&args, "mobile").unwrap(),
            vec![Target::new("mobile", 1), Target::new("other", 0)]
        );
        assert_eq!(resolve_targets(&[], "mobile").unwrap(), vec![Target::new("mobile", 0)]);
    }
}
