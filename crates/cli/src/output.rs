//! Plain-text listings.

use careplan_wire::{CarePlan, Intervention, Review, StaffMember};
use std::io::{self, Write};

pub fn care_plans(out: &mut impl Write, plans: &[CarePlan]) -> io::Result<()> {
    if plans.is_empty() {
        return writeln!(out, "No care plans found.");
    }
    for plan in plans {
        writeln!(
            out,
            "{}  {} [{}] (visit {})",
            plan.id, plan.title, plan.status, plan.visit_id
        )?;
        for goal in &plan.goals {
            writeln!(out, "  - {}  {}", goal.id, goal.title)?;
        }
    }
    Ok(())
}

pub fn staff(out: &mut impl Write, members: &[StaffMember]) -> io::Result<()> {
    if members.is_empty() {
        return writeln!(out, "No staff found.");
    }
    for member in members {
        writeln!(out, "{}  {}", member.id, member.display_name())?;
    }
    Ok(())
}

pub fn interventions(out: &mut impl Write, items: &[Intervention]) -> io::Result<()> {
    if items.is_empty() {
        return writeln!(out, "No interventions found.");
    }
    for item in items {
        let staff = item
            .assigned_staff_id
            .as_ref()
            .map(|id| format!(" -> {id}"))
            .unwrap_or_default();
        let deadline = item.deadline.as_deref().unwrap_or("no deadline");
        writeln!(out, "{}  {}{} ({})", item.id, item.title, staff, deadline)?;
    }
    Ok(())
}

pub fn reviews(out: &mut impl Write, items: &[Review]) -> io::Result<()> {
    if items.is_empty() {
        return writeln!(out, "No reviews found.");
    }
    for item in items {
        writeln!(
            out,
            "{}  {} by {}",
            item.id,
            item.review_date.as_deref().unwrap_or("undated"),
            item.reviewed_by
                .as_ref()
                .map(|id| id.as_str())
                .unwrap_or("unknown")
        )?;
        if let Some(notes) = item.notes.as_deref().filter(|n| !n.trim().is_empty()) {
            writeln!(out, "    {notes}")?;
        }
    }
    Ok(())
}
