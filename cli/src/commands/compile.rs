use std::io::{self, Write};
use std::path::Path;

use anyhow::Context;
use bootnet_common::config::Config;
use bootnet_core::ResolvedPlan;
use tracing::debug;

use crate::loader;

pub fn compile(path: &Path, cfg: &Config) -> anyhow::Result<()> {
    let doc = loader::load(path)?;
    let plan = bootnet_core::compile(&doc)
        .with_context(|| format!("'{}' is not a valid network document", path.display()))?;

    let rendered = render(&plan, cfg.pretty)?;
    debug!("Writing {} bytes of plan to stdout", rendered.len());

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{rendered}").context("failed to write plan to stdout")?;
    Ok(())
}

fn render(plan: &ResolvedPlan, pretty: bool) -> anyhow::Result<String> {
    let rendered = if pretty {
        serde_json::to_string_pretty(plan)?
    } else {
        serde_json::to_string(plan)?
    };
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{Format, parse};

    const NET_JSON: &str = r#"{ "version": 2, "eno1": { "dhcp4": true } }"#;

    #[test]
    fn compact_plan_is_a_single_line() {
        let plan = bootnet_core::compile(&parse(NET_JSON, Format::Json).unwrap()).unwrap();
        let compact = render(&plan, false).unwrap();
        assert!(!compact.contains('\n'));
        assert!(compact.starts_with(r#"{"primary":"eno1""#));

        let pretty = render(&plan, true).unwrap();
        assert!(pretty.lines().count() > 1);
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&pretty).unwrap(),
            serde_json::from_str::<serde_json::Value>(&compact).unwrap()
        );
    }
}
