use cli_table::format::Separator;
use cli_table::{Cell, CellStruct, ColorChoice, Style, Table, TableStruct};

use anyhow::Error;
use colored::Color as Colorization;
use colored::Colorize;

use crate::check::request::ResourceRequest;
use crate::check::status::NodeStatus;
use crate::check::{Action, Availability, AvailabilityCheck, CheckConfig};
use crate::client::output::outputs::Output;
use crate::common::format::{human_capacity, human_gb};
use crate::common::utils::str::pluralize;
use crate::common::utils::time::format_hms_duration;
use crate::config::QueueDefinition;
use crate::search::{LimitingFactor, SearchResult};

pub const ACTION_COLOR_SUBMIT: Colorization = Colorization::Green;
pub const ACTION_COLOR_CONFIRM: Colorization = Colorization::Yellow;
pub const ACTION_COLOR_ABORT: Colorization = Colorization::Red;

pub struct CliOutput {
    color_policy: ColorChoice,
}

impl CliOutput {
    pub fn new(color_policy: ColorChoice) -> CliOutput {
        CliOutput { color_policy }
    }

    fn render_vertical_table(&self, rows: Vec<Vec<CellStruct>>) -> String {
        let table = rows.table().separator(
            Separator::builder()
                .column(Some(Default::default()))
                .build(),
        );
        self.render_table(table)
    }

    fn render_horizontal_table(
        &self,
        rows: Vec<Vec<CellStruct>>,
        header: Vec<CellStruct>,
    ) -> String {
        let table = rows
            .table()
            .separator(
                Separator::builder()
                    .title(Some(Default::default()))
                    .column(Some(Default::default()))
                    .build(),
            )
            .title(header);
        self.render_table(table)
    }

    fn render_table(&self, table: TableStruct) -> String {
        match table.color_choice(self.color_policy).display() {
            Ok(display) => format!("{display}\n"),
            Err(e) => {
                log::error!("Cannot render table: {:?}", e);
                String::new()
            }
        }
    }

    /// Report of an interactive check: queue limits, the node status table
    /// (when the node could be queried) and the classification.
    pub fn render_interactive_check(
        &self,
        config: &CheckConfig,
        request: &ResourceRequest,
        check: &AvailabilityCheck,
    ) -> String {
        let limits = &config.limits;
        let mut output = format!(
            "Queue {}: max {} {}, {} memory, {} walltime\n",
            config.queue.bold(),
            limits.max_cores,
            pluralize("core", limits.max_cores as usize),
            limits.max_memory,
            format_hms_duration(&limits.max_walltime)
        );
        output.push_str(&format!(
            "Requested {} {} on node {}\n",
            request.cores,
            pluralize("core", request.cores as usize),
            config.node.bold()
        ));

        if let Some(status) = &check.status {
            let rows = node_status_rows(status)
                .into_iter()
                .map(|(name, value)| vec![name.cell().bold(true), value.cell()])
                .collect();
            output.push_str(&self.render_vertical_table(rows));
        }

        output.push_str(&format_availability(check.availability));
        output.push('\n');
        output
    }

    pub fn render_resource_search(&self, result: &SearchResult) -> String {
        let request = &result.request;
        let mut output = String::new();
        if request.auto_calculated {
            output.push_str(&format!(
                "Auto-calculated maximum: {} {} ({} GB per core + {} GB overhead)\n",
                request.cores,
                pluralize("core", request.cores as usize),
                request.mem_per_core_gb,
                request.mem_overhead_gb
            ));
        }
        output.push_str(&format!(
            "Looking for {} {} and {} GB of memory\n",
            request.cores,
            pluralize("core", request.cores as usize),
            request.memory_gb
        ));

        let queues: Vec<String> = result
            .queues
            .preferred
            .iter()
            .chain(result.queues.express.iter())
            .map(format_queue)
            .collect();
        if !queues.is_empty() {
            output.push_str(&format!("Recommended queues: {}\n", queues.join(" or ")));
        }

        if result.is_available() {
            output.push_str(&format!("{}\n", "Yes".color(ACTION_COLOR_SUBMIT).bold()));
            let rows = result
                .available
                .iter()
                .map(|node| {
                    vec![
                        node.name.as_str().cell(),
                        node.state.as_str().cell(),
                        node.free_cores.cell(),
                        human_gb(node.free_memory.gb()).cell(),
                    ]
                })
                .collect();
            output.push_str(&self.render_horizontal_table(
                rows,
                vec![
                    "Node".cell().bold(true),
                    "State".cell().bold(true),
                    "Free cores".cell().bold(true),
                    "Free memory".cell().bold(true),
                ],
            ));
            return output;
        }

        output.push_str(&format!(
            "{}, largest available allocations:\n",
            "No".color(ACTION_COLOR_ABORT).bold()
        ));
        if let Some(factor) = result.limiting_factor {
            output.push_str(format_limiting_factor(factor));
            output.push('\n');
        }
        if result.alternatives.is_empty() {
            output.push_str("No node has free capacity for a smaller request\n");
            return output;
        }
        let rows = result
            .alternatives
            .iter()
            .map(|alternative| {
                let practical = if alternative.practical_cores == 0 {
                    "insufficient memory for any cores".to_string()
                } else {
                    format!(
                        "{} {}, {}",
                        alternative.practical_cores,
                        pluralize("core", alternative.practical_cores as usize),
                        human_gb(alternative.practical_memory_gb)
                    )
                };
                vec![
                    alternative.node.name.as_str().cell(),
                    alternative.node.free_cores.cell(),
                    human_gb(alternative.node.free_memory.gb()).cell(),
                    practical.cell(),
                ]
            })
            .collect();
        output.push_str(&self.render_horizontal_table(
            rows,
            vec![
                "Node".cell().bold(true),
                "Free cores".cell().bold(true),
                "Free memory".cell().bold(true),
                "Could run".cell().bold(true),
            ],
        ));
        output
    }
}

/// Rows of the node status report, in display order.
pub fn node_status_rows(status: &NodeStatus) -> Vec<(&'static str, String)> {
    vec![
        ("Node", status.name.clone()),
        ("State", status.state.clone()),
        (
            "Cores",
            human_capacity(status.free_cores(), status.total_cores, ""),
        ),
        (
            "Memory",
            human_capacity(status.free_memory_gb(), status.total_memory_gb(), " GB"),
        ),
        (
            "Jobs",
            format!(
                "{} active {}",
                status.jobs.len(),
                pluralize("job", status.jobs.len())
            ),
        ),
    ]
}

fn action_color(action: Action) -> Colorization {
    match action {
        Action::SubmitNow => ACTION_COLOR_SUBMIT,
        Action::ConfirmQueue => ACTION_COLOR_CONFIRM,
        Action::Abort => ACTION_COLOR_ABORT,
    }
}

fn format_availability(availability: Availability) -> String {
    format!(
        "{}: {}",
        availability
            .as_str()
            .color(action_color(availability.action()))
            .bold(),
        availability.description()
    )
}

fn format_queue(queue: &QueueDefinition) -> String {
    match &queue.note {
        Some(note) => format!("{} ({note})", queue.short_name()),
        None => queue.short_name().to_string(),
    }
}

fn format_limiting_factor(factor: LimitingFactor) -> &'static str {
    match factor {
        LimitingFactor::Cores => "Not enough free cores",
        LimitingFactor::Memory => "Not enough free memory",
        LimitingFactor::Both => "Not enough free cores or memory",
    }
}

impl Output for CliOutput {
    fn print_interactive_check(
        &self,
        config: &CheckConfig,
        request: &ResourceRequest,
        check: &AvailabilityCheck,
    ) {
        print!("{}", self.render_interactive_check(config, request, check));
    }

    fn print_resource_search(&self, result: &SearchResult) {
        print!("{}", self.render_resource_search(result));
    }

    fn print_error(&self, error: Error) {
        eprintln!("{:?}", error);
    }
}
