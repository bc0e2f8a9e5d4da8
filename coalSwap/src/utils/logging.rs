use lazy_static::lazy_static;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter, prelude::*};
use tracing_timing::{Builder, Histogram};
use std::collections::HashMap;
use std::sync::Arc;
use parking_lot::RwLock;
use std::time::{Duration, Instant};
use std::cell::RefCell;

// Define categories for different types of operations
#[derive(Hash, Eq, PartialEq, Clone, Debug)]
pub enum OperationCategory {
    DataLoad,
    Computation {
        subcategory: ComputeType,
    },
    Export {
        subcategory: ExportType,
    },
    Other,
}

#[derive(Hash, Eq, PartialEq, Clone, Debug)]
pub enum ComputeType {
    Tco,
    Ranking,
    Merge,
    Statistics,
}

#[derive(Hash, Eq, PartialEq, Clone, Debug)]
pub enum ExportType {
    Table,
    Plot,
    Summary,
}

impl OperationCategory {
    pub fn as_str(&self) -> String {
        match self {
            OperationCategory::DataLoad => "Data Load".to_string(),
            OperationCategory::Computation { subcategory } => {
                format!("Computation - {}", match subcategory {
                    ComputeType::Tco => "TCO",
                    ComputeType::Ranking => "Ranking",
                    ComputeType::Merge => "Merge",
                    ComputeType::Statistics => "Statistics",
                })
            },
            OperationCategory::Export { subcategory } => {
                format!("Export - {}", match subcategory {
                    ExportType::Table => "Table",
                    ExportType::Plot => "Plot",
                    ExportType::Summary => "Summary",
                })
            },
            OperationCategory::Other => "Other Operations".to_string(),
        }
    }
}

thread_local! {
    static TIMING_STACK: RefCell<Vec<String>> = RefCell::new(Vec::new());
}

lazy_static! {
    static ref TIMING_ENABLED: AtomicBool = AtomicBool::new(false);
    static ref CATEGORY_TIMINGS: Arc<RwLock<HashMap<OperationCategory, Histogram<u64>>>> = Arc::new(RwLock::new(HashMap::new()));
    static ref HIERARCHICAL_TIMINGS: Arc<RwLock<HashMap<String, (Duration, usize, Vec<String>)>>> = Arc::new(RwLock::new(HashMap::new()));
}

// 1ns..60s at 3 significant figures
const HISTOGRAM_MAX_NS: u64 = 60_000_000_000;

fn new_histogram() -> Histogram<u64> {
    Histogram::<u64>::new_with_bounds(1, HISTOGRAM_MAX_NS, 3)
        .expect("constant histogram bounds are valid")
}

/// Records the wall time of the enclosing scope when dropped.
pub struct TimingGuard {
    function_name: String,
    category: OperationCategory,
    start: Instant,
}

impl Drop for TimingGuard {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        record_timing_end(&self.function_name, duration, &self.category);
    }
}

pub fn start_timing(function_name: &str, category: OperationCategory) -> TimingGuard {
    TIMING_STACK.with(|stack| {
        stack.borrow_mut().push(function_name.to_string());
    });

    TimingGuard {
        function_name: function_name.to_string(),
        category,
        start: Instant::now(),
    }
}

fn record_timing_end(function_name: &str, duration: Duration, category: &OperationCategory) {
    let parent = TIMING_STACK.with(|stack| {
        let mut stack = stack.borrow_mut();
        stack.pop();
        stack.last().cloned()
    });

    if !is_timing_enabled() {
        return;
    }

    {
        let mut hierarchical = HIERARCHICAL_TIMINGS.write();
        let entry = hierarchical
            .entry(function_name.to_string())
            .or_insert((Duration::from_nanos(0), 0, Vec::new()));
        entry.0 += duration;
        entry.1 += 1;
        if let Some(parent_name) = parent {
            if !entry.2.contains(&parent_name) {
                entry.2.push(parent_name);
            }
        }
    }

    let duration_ns = (duration.as_nanos() as u64).clamp(1, HISTOGRAM_MAX_NS);
    let mut category_timings = CATEGORY_TIMINGS.write();
    let histogram = category_timings
        .entry(category.clone())
        .or_insert_with(new_histogram);
    let _ = histogram.record(duration_ns);
}

/// Installs the global subscriber. `RUST_LOG` still applies on top of the
/// defaults.
pub fn init_logging(enable_timing: bool, debug_logging: bool) -> anyhow::Result<()> {
    TIMING_ENABLED.store(enable_timing, Ordering::SeqCst);

    let crate_level = if debug_logging { "coalswap=debug" } else { "coalswap=info" };
    let env_filter = EnvFilter::from_default_env()
        .add_directive(Level::INFO.into())
        .add_directive(crate_level.parse()?);

    let fmt_layer = if debug_logging {
        fmt::layer().pretty().boxed()
    } else {
        fmt::layer().compact().with_target(false).boxed()
    };

    let timing_layer = enable_timing.then(|| Builder::default().layer(new_histogram).boxed());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(timing_layer);

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

pub fn is_timing_enabled() -> bool {
    TIMING_ENABLED.load(Ordering::SeqCst)
}

pub fn print_timing_report() {
    if !is_timing_enabled() {
        return;
    }

    println!("\nPerformance Report");
    println!("==========================");

    println!("\nHierarchical Timing:");
    println!("---------------------------");
    let hierarchical = HIERARCHICAL_TIMINGS.read();
    let mut entries: Vec<_> = hierarchical.iter().collect();
    entries.sort_by(|a, b| b.1.0.cmp(&a.1.0));

    for (function_name, (total_duration, count, parents)) in entries {
        let avg_duration = total_duration.div_f64(*count as f64);
        println!(
            "{}: total={:.3}s, count={}, avg={:.3}ms{}",
            function_name,
            total_duration.as_secs_f64(),
            count,
            avg_duration.as_secs_f64() * 1000.0,
            if !parents.is_empty() {
                format!("\n  Called by: {}", parents.join(", "))
            } else {
                String::new()
            }
        );
    }

    println!("\nBy Category:");
    println!("------------------------");
    let category_timings = CATEGORY_TIMINGS.read();
    let mut category_vec: Vec<_> = category_timings.iter().collect();
    category_vec.sort_by(|a, b| {
        let a_total = a.1.mean() * a.1.len() as f64;
        let b_total = b.1.mean() * b.1.len() as f64;
        b_total.partial_cmp(&a_total).unwrap_or(std::cmp::Ordering::Equal)
    });

    let total_time: f64 = category_vec.iter()
        .map(|(_, hist)| hist.mean() * (hist.len() as f64))
        .sum();

    for (category, histogram) in category_vec {
        let category_total = histogram.mean() * (histogram.len() as f64);
        let percentage = if total_time > 0.0 { category_total / total_time * 100.0 } else { 0.0 };
        println!(
            "{}: {:.1}% of total time\n  mean={:.3}ms, p95={:.3}ms, count={}",
            category.as_str(),
            percentage,
            histogram.mean() / 1_000_000.0,
            histogram.value_at_quantile(0.95) as f64 / 1_000_000.0,
            histogram.len(),
        );
    }

    println!("==========================\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_labels() {
        let tco = OperationCategory::Computation { subcategory: ComputeType::Tco };
        assert_eq!(tco.as_str(), "Computation - TCO");
        let plot = OperationCategory::Export { subcategory: ExportType::Plot };
        assert_eq!(plot.as_str(), "Export - Plot");
    }

    #[test]
    fn nested_guards_unwind_the_stack() {
        {
            let _outer = start_timing("outer", OperationCategory::Other);
            {
                let _inner = start_timing("inner", OperationCategory::DataLoad);
                TIMING_STACK.with(|s| assert_eq!(s.borrow().len(), 2));
            }
            TIMING_STACK.with(|s| assert_eq!(s.borrow().len(), 1));
        }
        TIMING_STACK.with(|s| assert!(s.borrow().is_empty()));
    }
}
