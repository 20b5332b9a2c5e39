use trk::output::{format_human, HumanOutput};

#[test]
fn format_human_includes_sections() {
    let mut human = HumanOutput::new("Task updated");
    human.push_summary("Id", "tsk-aa11bb22");
    human.push_summary("Actor", "alice");
    human.push_detail("status: new -> research");
    human.push_warning("no actor set; this save was not recorded in history");
    human.push_next_step("trk task history tsk-aa11bb22");

    let rendered = format_human(&human);
    assert!(rendered.contains("Task updated"));
    assert!(rendered.contains("Summary:"));
    assert!(rendered.contains("- Id: tsk-aa11bb22"));
    assert!(rendered.contains("- Actor: alice"));
    assert!(rendered.contains("Details:"));
    assert!(rendered.contains("- status: new -> research"));
    assert!(rendered.contains("Warnings:"));
    assert!(rendered.contains("- no actor set; this save was not recorded in history"));
    assert!(rendered.contains("Next steps:"));
    assert!(rendered.contains("- trk task history tsk-aa11bb22"));
}

#[test]
fn format_human_omits_empty_sections() {
    let human = HumanOutput::new("No task changes recorded");
    let rendered = format_human(&human);
    assert_eq!(rendered, "No task changes recorded");
}

#[test]
fn summary_entries_without_values_render_bare() {
    let mut human = HumanOutput::new("Task history");
    human.push_summary("empty history", "");
    let rendered = format_human(&human);
    assert!(rendered.contains("- empty history"));
    assert!(!rendered.contains("- empty history:"));
}
