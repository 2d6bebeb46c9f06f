use std::cell::RefCell;
use std::sync::Once;

use crate::common::parser::{NomResult, consume_all};
use crate::pbs::client::PbsClient;

pub fn check_parse_error<F: FnMut(&str) -> NomResult<O>, O>(
    parser: F,
    input: &str,
    expected_error: &str,
) {
    match consume_all(parser, input) {
        Err(e) => {
            assert_eq!(e.to_string(), expected_error);
        }
        _ => panic!("The parser should have failed"),
    }
}

thread_local! {
    static CAPTURED_WARNINGS: RefCell<Option<Vec<String>>> = const { RefCell::new(None) };
}

struct WarningCapture;

impl log::Log for WarningCapture {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::Level::Warn
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            CAPTURED_WARNINGS.with(|captured| {
                if let Some(warnings) = captured.borrow_mut().as_mut() {
                    warnings.push(record.args().to_string());
                }
            });
        }
    }

    fn flush(&self) {}
}

static WARNING_CAPTURE: WarningCapture = WarningCapture;
static INSTALL_CAPTURE: Once = Once::new();

/// Runs `f` and returns warnings and errors it logged on the current thread.
pub fn capture_warnings<T>(f: impl FnOnce() -> T) -> (T, Vec<String>) {
    INSTALL_CAPTURE.call_once(|| {
        if log::set_logger(&WARNING_CAPTURE).is_ok() {
            log::set_max_level(log::LevelFilter::Warn);
        }
    });
    CAPTURED_WARNINGS.with(|captured| *captured.borrow_mut() = Some(vec![]));
    let result = f();
    let warnings =
        CAPTURED_WARNINGS.with(|captured| captured.borrow_mut().take().unwrap_or_default());
    (result, warnings)
}

/// PBS client returning canned command output. `None` simulates a failed command.
#[derive(Default)]
pub struct MockPbs {
    pub queue_info: Option<String>,
    pub user_jobs: Option<String>,
    pub node_info: Option<String>,
    pub node_list_json: Option<String>,
    pub node_list: Option<String>,
}

fn canned(command: &str, output: &Option<String>) -> anyhow::Result<String> {
    output
        .clone()
        .ok_or_else(|| anyhow::anyhow!("{command} execution failed\nExit code: 1"))
}

impl PbsClient for MockPbs {
    fn queue_info(&self, _queue: &str) -> anyhow::Result<String> {
        canned("qstat", &self.queue_info)
    }

    fn user_jobs(&self, _user: &str) -> anyhow::Result<String> {
        canned("qstat", &self.user_jobs)
    }

    fn node_info(&self, _node: &str) -> anyhow::Result<String> {
        canned("pbsnodes", &self.node_info)
    }

    fn node_list_json(&self) -> anyhow::Result<String> {
        canned("pbsnodes", &self.node_list_json)
    }

    fn node_list(&self) -> anyhow::Result<String> {
        canned("pbsnodes", &self.node_list)
    }
}

pub const QSTAT_QUEUE_JSON: &str = r#"{
    "timestamp": 1729000000,
    "pbs_version": "2022.1.1",
    "pbs_server": "pbs01",
    "Queue": {
        "interactq": {
            "queue_type": "Execution",
            "total_jobs": 3,
            "max_run": "[u:PBS_GENERIC=1]",
            "resources_max": {
                "mem": "32gb",
                "ncpus": 8,
                "walltime": "08:00:00"
            },
            "resources_default": {
                "walltime": "01:00:00"
            },
            "enabled": "True",
            "started": "True"
        }
    }
}"#;

pub const QSTAT_USER_JOBS: &str = r#"
pbs01:
                                                            Req'd  Req'd   Elap
Job ID          Username Queue    Jobname    SessID NDS TSK Memory Time  S Time
--------------- -------- -------- ---------- ------ --- --- ------ ----- - -----
318628.pbs01    jdoe     largeq   opt_b3lyp   51234   1  16   28gb 72:00 R 10:02
318701.pbs01    jdoe     interac* STDIN       60211   1   4    8gb 04:00 R 00:12
"#;

pub const QSTAT_USER_JOBS_BATCH_ONLY: &str = r#"
pbs01:
                                                            Req'd  Req'd   Elap
Job ID          Username Queue    Jobname    SessID NDS TSK Memory Time  S Time
--------------- -------- -------- ---------- ------ --- --- ------ ----- - -----
318628.pbs01    jdoe     largeq   opt_b3lyp   51234   1  16   28gb 72:00 R 10:02
"#;

pub const PBSNODES_JSON: &str = r#"{
    "timestamp": 1729000000,
    "pbs_version": "2022.1.1",
    "pbs_server": "pbs01",
    "nodes": {
        "node001": {
            "Mom": "node001.cluster",
            "state": "free",
            "resources_available": {"Qlist": "smallq,mediumq", "ncpus": 20}
        },
        "node100": {
            "Mom": "node100.cluster",
            "state": "free",
            "comment": "Dedicated node for interactive jobs",
            "resources_available": {"Qlist": "interactq", "ncpus": 20}
        }
    }
}"#;

/// Builds the text output of `pbsnodes <node>`.
pub fn pbsnodes_text(name: &str, attributes: &[(&str, &str)]) -> String {
    let mut output = format!("{name}\n");
    for (key, value) in attributes {
        output.push_str(&format!("     {key} = {value}\n"));
    }
    output
}

pub const PBSNODES_LISTING: &str = r#"asax001
     Mom = asax001.cluster
     ntype = PBS
     state = free
     pcpus = 48
     resources_available.mem = 251gb
     resources_available.ncpus = 48
     resources_available.Qlist = smallq,mediumq
     resources_available.vntype = compute_vnode
     resources_assigned.mem = 0kb
     resources_assigned.ncpus = 0

asax002
     Mom = asax002.cluster
     state = free
     jobs = 318628.pbs01/0, 318628.pbs01/1
     resources_available.mem = 256gb
     resources_available.ncpus = 48
     resources_available.Qlist = mediumq,largeq
     resources_available.vntype = compute_vnode
     resources_assigned.mem = 205520896kb
     resources_assigned.ncpus = 40

asax003
     state = offline
     resources_available.mem = 251gb
     resources_available.ncpus = 48
     resources_available.Qlist = smallq
     resources_available.vntype = compute_vnode

asax004
     state = job-busy,down
     resources_available.mem = 251gb
     resources_available.ncpus = 48
     resources_available.Qlist = mediumq
     resources_available.vntype = compute_vnode

login1
     state = free
     resources_available.mem = 64gb
     resources_available.ncpus = 16
     resources_available.Qlist = smallq
     resources_available.vntype = login_vnode

asax010
     state = free
     resources_available.mem = 512gb
     resources_available.ncpus = 32
     resources_available.Qlist = bigmemq
     resources_available.vntype = compute_vnode
     resources_assigned.mem = 100gb
     resources_assigned.ncpus = 24

asax011
     state = free
     comment = interactive jobs only
     resources_available.mem = 128gb
     resources_available.ncpus = 20
     resources_available.Qlist = interactq
     resources_available.vntype = compute_vnode

gpu01
     state = free
     resources_available.mem = 384gb
     resources_available.ncpus = 40
     resources_available.ngpus = 4
     resources_available.Qlist = gpuq
     resources_available.vntype = gpu_vnode
"#;
