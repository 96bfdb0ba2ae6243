mod perf_stat;

pub use perf_stat::{discover_cpus, parse_cpu_list, PerfStatDriver, PerfStatDriverBuilder};
