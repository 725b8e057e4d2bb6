//! Funnel 指标收集模块
//!
//! 记录错误发布、监听器异常与 sink 写入结果。

use metrics::{counter, describe_counter};
use std::collections::HashMap;

/// 注册指标描述 (Prometheus HELP 文本)
pub fn describe_metrics() {
    describe_counter!(
        "sluice_errors_raised_total",
        "Values published to a funnel topic"
    );
    describe_counter!(
        "sluice_listener_panics_total",
        "Listeners that panicked during dispatch"
    );
    describe_counter!(
        "sluice_sink_writes_total",
        "Sink write attempts by outcome"
    );
    describe_counter!(
        "sluice_sink_dropped_total",
        "Errors dropped because a sink queue was full or closed"
    );
}

/// 记录一次发布
pub fn record_error_raised(topic: &str) {
    counter!("sluice_errors_raised_total", "topic" => topic.to_string()).increment(1);
}

/// 记录监听器 panic
pub fn record_listener_panic(topic: &str) {
    counter!("sluice_listener_panics_total", "topic" => topic.to_string()).increment(1);
}

/// 记录 sink 写入结果
pub fn record_sink_write(sink_name: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "sluice_sink_writes_total",
        "sink" => sink_name.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// 记录 sink 丢弃
pub fn record_sink_dropped(sink_name: &str) {
    counter!("sluice_sink_dropped_total", "sink" => sink_name.to_string()).increment(1);
}

/// 错误指标聚合器
///
/// 在内存中聚合计数，便于进程退出时输出摘要。
#[derive(Debug, Clone, Default)]
pub struct ErrorMetricsAggregator {
    /// 各 topic 发布次数
    pub raised: HashMap<String, u64>,

    /// 监听器 panic 次数
    pub listener_panics: u64,

    /// 各 sink 写入 (成功, 失败)
    pub sink_writes: HashMap<String, (u64, u64)>,

    /// 各 sink 丢弃次数
    pub sink_dropped: HashMap<String, u64>,
}

impl ErrorMetricsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_raised(&mut self, topic: &str, count: u64) {
        *self.raised.entry(topic.to_string()).or_insert(0) += count;
    }

    pub fn on_listener_panic(&mut self) {
        self.listener_panics += 1;
    }

    /// 累加 sink 写入结果
    pub fn on_sink_writes(&mut self, sink_name: &str, succeeded: u64, failed: u64) {
        let entry = self.sink_writes.entry(sink_name.to_string()).or_default();
        entry.0 += succeeded;
        entry.1 += failed;
    }

    pub fn on_sink_dropped(&mut self, sink_name: &str, count: u64) {
        *self.sink_dropped.entry(sink_name.to_string()).or_insert(0) += count;
    }

    /// 生成摘要
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_raised: self.raised.values().sum(),
            listener_panics: self.listener_panics,
            sink_successes: self.sink_writes.values().map(|(ok, _)| ok).sum(),
            sink_failures: self.sink_writes.values().map(|(_, failed)| failed).sum(),
            sink_dropped: self.sink_dropped.values().sum(),
        }
    }
}

/// 指标摘要
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSummary {
    pub total_raised: u64,
    pub listener_panics: u64,
    pub sink_successes: u64,
    pub sink_failures: u64,
    pub sink_dropped: u64,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "raised={} listener_panics={} sink_ok={} sink_failed={} sink_dropped={}",
            self.total_raised,
            self.listener_panics,
            self.sink_successes,
            self.sink_failures,
            self.sink_dropped
        )
    }
}
