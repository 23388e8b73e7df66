use std::path::Path;

use anyhow::Context;
use bootnet_core::plan::{Action, PlanEntry};
use bootnet_core::ResolvedPlan;
use colored::*;

use crate::loader;
use crate::terminal::print;

type Detail = (String, ColoredString);

pub fn check(path: &Path) -> anyhow::Result<()> {
    let doc = loader::load(path)?;
    let plan = bootnet_core::compile(&doc)
        .with_context(|| format!("'{}' is not a valid network document", path.display()))?;

    print::header("network plan");
    for (idx, entry) in plan.entries.iter().enumerate() {
        print::tree_head(idx, &entry.name);
        print::as_tree_one_level(&entry_details(entry));
    }
    print_summary(&plan, path);
    Ok(())
}

fn entry_details(entry: &PlanEntry) -> Vec<Detail> {
    let mut details: Vec<Detail> = vec![("type".to_string(), action_label(&entry.action))];

    if !entry.depends_on.is_empty() {
        let deps: Vec<&str> = entry.depends_on.iter().map(|d| d.as_str()).collect();
        details.push(("needs".to_string(), deps.join(", ").normal()));
    }

    let addressing = &entry.addressing;
    if let Some(dhcp) = addressing.dhcp4 {
        details.push(("dhcp4".to_string(), dhcp_label(dhcp.enabled, dhcp.optional)));
    }
    if let Some(dhcp) = addressing.dhcp6 {
        details.push(("dhcp6".to_string(), dhcp_label(dhcp.enabled, dhcp.optional)));
    }
    for addr in addressing.static4.iter().chain(&addressing.static6) {
        details.push(("static".to_string(), addr.as_str().cyan()));
    }
    for route in &addressing.routes {
        let via = route.via.map(|v| format!(" via {v}")).unwrap_or_default();
        let metric = route.route_metric.map(|m| format!(" metric {m}")).unwrap_or_default();
        details.push(("route".to_string(), format!("{}{via}{metric}", route.to).normal()));
    }

    if entry.primary {
        details.push(("primary".to_string(), "yes".green().bold()));
    }
    details
}

fn action_label(action: &Action) -> ColoredString {
    match action {
        Action::Interface => "interface".normal(),
        Action::Bond { members, .. } => {
            let members: Vec<&str> = members.iter().map(|m| m.as_str()).collect();
            format!("bond over {}", members.join(", ")).yellow()
        }
        Action::Vlan { device, id } => format!("vlan {id} on {device}").magenta(),
    }
}

fn dhcp_label(enabled: bool, optional: bool) -> ColoredString {
    match (enabled, optional) {
        (false, _) => "disabled".bright_black(),
        (true, true) => "enabled (optional)".green(),
        (true, false) => "enabled".green(),
    }
}

fn print_summary(plan: &ResolvedPlan, path: &Path) {
    print::fat_separator();
    let key_width = "primary address".len();
    print::aligned_line("document", key_width, path.display().to_string().bright_white());
    print::aligned_line("entries", key_width, plan.entries.len().to_string().green().bold());
    print::aligned_line("primary", key_width, plan.primary.as_str().green().bold());
    let address = plan
        .primary_address
        .map_or_else(|| "dynamic".bright_black(), |a| a.to_string().cyan());
    print::aligned_line("primary address", key_width, address);
}
