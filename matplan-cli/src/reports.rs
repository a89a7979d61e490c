use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::io::Write;

use matplan_core::{
    AggregatedMaterial, FarmingReport, InventoryLedger, MaterialFilter, Plan, PlanSummary,
    SourceUpdate,
};

/// Everything the plan command reports on.
#[derive(Debug)]
pub struct PlanView<'a> {
    pub entity_id: u32,
    pub entity_name: &'a str,
    pub plan: &'a Plan,
    pub filter: &'a MaterialFilter,
    pub updates: &'a [SourceUpdate],
    pub farming: &'a [FarmingReport],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MaterialRow<'a> {
    #[serde(flatten)]
    material: &'a AggregatedMaterial,
    deficit: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanDocument<'a> {
    entity_id: u32,
    entity_name: &'a str,
    summary: PlanSummary,
    materials: Vec<MaterialRow<'a>>,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    updates: &'a [SourceUpdate],
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    farming: &'a [FarmingReport],
}

fn rows<'a>(view: &'a PlanView<'a>) -> Vec<MaterialRow<'a>> {
    view.filter
        .apply(view.plan)
        .map(|material| MaterialRow {
            material,
            deficit: material.deficit(),
        })
        .collect()
}

pub fn generate_plan_console(out: &mut dyn Write, view: &PlanView<'_>) -> Result<()> {
    let summary = view.plan.summary();
    writeln!(
        out,
        "{}",
        format!("📋 Upgrade Plan: {} (#{})", view.entity_name, view.entity_id)
            .bright_cyan()
            .bold()
    )?;
    writeln!(out, "{}", "==============================".cyan())?;

    if view.plan.is_empty() {
        writeln!(out, "{}", "✅ Nothing to farm, target already reached.".green())?;
        return Ok(());
    }

    writeln!(out, "Materials: {}", summary.distinct_materials)?;
    writeln!(
        out,
        "Outstanding: {}",
        summary.outstanding_materials.to_string().yellow()
    )?;
    writeln!(out, "Total deficit: {}", summary.total_deficit)?;
    writeln!(out, "QP deficit: {}", summary.currency_deficit)?;
    writeln!(out)?;

    for row in rows(view) {
        let m = row.material;
        let status = if row.deficit == 0 {
            "✅".green()
        } else {
            "⛏️ ".yellow()
        };
        writeln!(
            out,
            "{status} {} [{}] {}/{} (need {})",
            m.name.bold(),
            m.rarity_label,
            m.current,
            m.required,
            row.deficit.to_string().red()
        )?;
        let sources: Vec<String> = m.source_ids.iter().map(ToString::to_string).collect();
        writeln!(out, "   Sources: {}", sources.join(", "))?;
    }

    if !view.updates.is_empty() {
        writeln!(out)?;
        writeln!(out, "{}", "🔔 Inventory Updates".bright_yellow().bold())?;
        for update in view.updates {
            writeln!(out, "   {} {:+}", update.source_id, update.delta)?;
        }
    }

    if !view.farming.is_empty() {
        writeln!(out)?;
        generate_farming_console(out, view.farming)?;
    }
    Ok(())
}

pub fn generate_plan_json(out: &mut dyn Write, view: &PlanView<'_>) -> Result<()> {
    let document = PlanDocument {
        entity_id: view.entity_id,
        entity_name: view.entity_name,
        summary: view.plan.summary(),
        materials: rows(view),
        updates: view.updates,
        farming: view.farming,
    };
    let json_output = serde_json::to_string_pretty(&document)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

pub fn generate_plan_markdown(out: &mut dyn Write, view: &PlanView<'_>) -> Result<()> {
    let summary = view.plan.summary();
    writeln!(out, "# Upgrade Plan: {} (#{})\n", view.entity_name, view.entity_id)?;

    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Materials**: {}", summary.distinct_materials)?;
    writeln!(out, "- **Outstanding**: {}", summary.outstanding_materials)?;
    writeln!(out, "- **Total deficit**: {}", summary.total_deficit)?;
    writeln!(out, "- **QP deficit**: {}\n", summary.currency_deficit)?;

    if view.plan.is_empty() {
        writeln!(out, "_Nothing to farm._")?;
        return Ok(());
    }

    writeln!(out, "## Materials\n")?;
    writeln!(out, "| Material | Rarity | Owned | Required | Deficit |")?;
    writeln!(out, "|---|---|---:|---:|---:|")?;
    for row in rows(view) {
        let m = row.material;
        writeln!(
            out,
            "| {} | {} | {} | {} | {} |",
            m.name, m.rarity_label, m.current, m.required, row.deficit
        )?;
    }
    writeln!(out)?;

    if !view.farming.is_empty() {
        generate_farming_markdown(out, view.farming)?;
    }
    Ok(())
}

pub fn generate_farming_console(out: &mut dyn Write, reports: &[FarmingReport]) -> Result<()> {
    writeln!(out, "{}", "🗺️  Farming Spots".bright_cyan().bold())?;
    writeln!(out, "{}", "================".cyan())?;
    for report in reports {
        match report {
            FarmingReport::Matched {
                item_name,
                tier,
                spots,
                estimated_ap,
                ..
            } => {
                writeln!(out, "{} ({tier} match)", item_name.bold())?;
                if spots.is_empty() {
                    writeln!(out, "   {}", "No known drop locations".yellow())?;
                }
                for spot in spots {
                    writeln!(
                        out,
                        "   #{} {} - {} | {} AP | {:.1}% | 1 drop: {} runs | deficit: {} runs",
                        spot.rank,
                        spot.area,
                        spot.quest,
                        spot.ap_cost,
                        spot.drop_rate_percent,
                        spot.runs_for_one_drop,
                        spot.runs_for_deficit
                    )?;
                }
                if let Some(ap) = estimated_ap {
                    writeln!(out, "   Estimated AP: {}", ap.to_string().green())?;
                }
            }
            FarmingReport::NotFound { query } => {
                writeln!(out, "⚠️  No farming data for {}", query.yellow())?;
            }
        }
    }
    Ok(())
}

pub fn generate_farming_json(out: &mut dyn Write, reports: &[FarmingReport]) -> Result<()> {
    let json_output = serde_json::to_string_pretty(reports)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

pub fn generate_farming_markdown(out: &mut dyn Write, reports: &[FarmingReport]) -> Result<()> {
    writeln!(out, "## Farming Spots\n")?;
    for report in reports {
        match report {
            FarmingReport::Matched {
                item_name,
                tier,
                spots,
                estimated_ap,
                ..
            } => {
                writeln!(out, "### {item_name} ({tier} match)\n")?;
                if spots.is_empty() {
                    writeln!(out, "_No known drop locations._\n")?;
                    continue;
                }
                writeln!(out, "| # | Area | Quest | AP | Drop % | Runs/drop | Runs total |")?;
                writeln!(out, "|---:|---|---|---:|---:|---:|---:|")?;
                for spot in spots {
                    writeln!(
                        out,
                        "| {} | {} | {} | {} | {:.1} | {} | {} |",
                        spot.rank,
                        spot.area,
                        spot.quest,
                        spot.ap_cost,
                        spot.drop_rate_percent,
                        spot.runs_for_one_drop,
                        spot.runs_for_deficit
                    )?;
                }
                if let Some(ap) = estimated_ap {
                    writeln!(out, "\n- **Estimated AP**: {ap}")?;
                }
                writeln!(out)?;
            }
            FarmingReport::NotFound { query } => {
                writeln!(out, "### {query}\n\n_No farming data._\n")?;
            }
        }
    }
    Ok(())
}

pub fn generate_inventory_console(out: &mut dyn Write, ledger: &InventoryLedger) -> Result<()> {
    writeln!(out, "{}", "🎒 Inventory".bright_cyan().bold())?;
    writeln!(out, "{}", "============".cyan())?;
    if ledger.is_empty() {
        writeln!(out, "(empty)")?;
    }
    for (key, quantity) in ledger.export() {
        writeln!(out, "{key:20} {quantity}")?;
    }
    Ok(())
}

pub fn generate_inventory_json(out: &mut dyn Write, ledger: &InventoryLedger) -> Result<()> {
    writeln!(out, "{}", ledger.export_json()?)?;
    Ok(())
}

pub fn generate_inventory_markdown(out: &mut dyn Write, ledger: &InventoryLedger) -> Result<()> {
    writeln!(out, "# Inventory\n")?;
    writeln!(out, "| Resource | Owned |")?;
    writeln!(out, "|---|---:|")?;
    for (key, quantity) in ledger.export() {
        writeln!(out, "| {key} | {quantity} |")?;
    }
    Ok(())
}
