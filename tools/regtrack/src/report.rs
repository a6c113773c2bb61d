use crate::session::SessionResult;

const RULE_WIDTH: usize = 69;

pub fn render_report(session: &SessionResult) -> String {
    let mut out = String::new();
    out.push_str(&"-".repeat(RULE_WIDTH));
    out.push('\n');
    out.push_str("Regression testing results:\n\n");

    if session.newly_passed_count == 0 {
        out.push_str("No new tests have passed.\n");
    } else {
        out.push_str(&format!(
            "{} new test(s) now successfully run: \n\t{}\n",
            session.newly_passed_count,
            session.fixed_tests.join(",\n\t")
        ));
    }
    out.push('\n');

    if session.regression_count == 0 {
        out.push_str("No tests failed their regression test.\n");
    } else {
        out.push_str(&format!(
            "{} test(s) failed their regression test: \n\t{}\n",
            session.regression_count,
            session.broken_tests.join(",\n\t")
        ));
    }
    out
}
