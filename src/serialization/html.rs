//! HTML rendering of a machine set.
//!
//! One bordered transition table per machine — a row per state, a column
//! per cipher symbol, the acceptance flag in the last column — followed by
//! the machine's balancing halves. Meant for eyeballing freshly generated
//! keys, not for machine consumption.

use crate::machine::{Machine, MachineSet};

/// Render every machine of the set into a single HTML document.
pub fn render_html(machines: &MachineSet) -> String {
    let tables: Vec<String> = machines.iter().map(machine_table).collect();
    format!(
        "<!DOCTYPE html><html><head></head><body>\n{}\n</body></html>",
        tables.join("\n</br>\n")
    )
}

fn machine_table(machine: &Machine) -> String {
    let mut html = Vec::new();

    html.push("<table border=\"1\">".to_string());
    html.push("  <tr>".to_string());
    html.push(format!("    <th><i>'{}'</i></th>", machine.letter()));
    for &symbol in machine.alphabet() {
        html.push(format!("    <th>{symbol}</th>"));
    }
    html.push("    <th></th>".to_string());
    html.push("  </tr>".to_string());

    for &state in machine.states() {
        html.push("  <tr>".to_string());
        html.push(format!("    <td>{state}</td>"));
        for &symbol in machine.alphabet() {
            let targets: Vec<String> = machine
                .transitions()
                .iter()
                .filter(|t| t.from_state == state && t.symbol == symbol)
                .flat_map(|t| t.to_states.iter().map(ToString::to_string))
                .collect();
            html.push(format!("    <td>{}</td>", targets.join(",")));
        }
        let accepting = if state == machine.sink() { "1" } else { "0" };
        html.push(format!("    <td>{accepting}</td>"));
        html.push("  </tr>".to_string());
    }

    html.push("</table>".to_string());

    let balancing = machine.balancing();
    let left: String = balancing.left.iter().collect();
    let right: String = balancing.right.iter().collect();
    html.push(format!(
        "<span><b>Balancing</b> -- <b>Left:</b> {left}; <b>Right:</b> {right};</span>"
    ));

    html.join("\n")
}
