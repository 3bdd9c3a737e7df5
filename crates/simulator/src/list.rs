// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! List-scheduling simulator.
//!
//! # Model
//!
//! Every replica of every node becomes a *computation* task on its device.
//! Every data edge becomes one *transfer* task per (producer piece,
//! consumer replica) pair that has to move bytes:
//!
//! ```text
//! producer form   consumer form   each consumer replica receives
//! ─────────────   ─────────────   ──────────────────────────────────────
//! replicated      replicated      the whole tensor from the co-located
//!                                 producer replica (else replica 0)
//! replicated      partitioned     its 1/k slice, same source rule
//! partitioned     replicated      every producer piece (concat)
//! partitioned     partitioned     the overlapping parts of each piece
//! ```
//!
//! Tasks whose dependencies are satisfied are queued FIFO. A device runs
//! one computation at a time and a link carries one transfer at a time;
//! time jumps to the earliest finishing task. A transfer over a link costs
//! `bytes / bandwidth + 12` µs; a same-device transfer is free.
//!
//! Tensor buffers become resident on a device when produced or received
//! and are released after their last reader finishes; the per-device high
//! water mark is the reported peak memory.

use crate::trace::{DiagnosticReport, TraceCategory, TraceEvent};
use crate::{Evaluation, EvaluationError, EvaluationRequest, StrategyEvaluator};
use cluster::LinkTopology;
use std::cmp::{self, Ordering};
use std::collections::{BinaryHeap, BTreeMap, VecDeque};
use strategy::Form;

/// Fixed per-transfer latency in microseconds.
pub const TRANSFER_LATENCY_US: u64 = 12;

/// Reference [`StrategyEvaluator`] backed by a list scheduler.
#[derive(Debug, Clone, Default)]
pub struct ListSimulator;

/// Result of one simulation.
#[derive(Debug, Clone)]
pub struct Schedule {
    /// Finish time of the last task, in microseconds.
    pub makespan: u64,
    /// Peak resident bytes per device.
    pub peak_memory: Vec<u64>,
    /// Busy intervals of devices and links.
    pub timeline: Vec<TraceEvent>,
    /// Number of nodes left after pruning to the sinks.
    pub nodes_simulated: usize,
    /// Number of scheduled tasks.
    pub tasks: usize,
}

// ── Task graph ─────────────────────────────────────────────────────

#[derive(Debug)]
enum TaskKind {
    Computation {
        node: usize,
        device: usize,
        duration: u64,
    },
    Transfer {
        producer: usize,
        consumer: usize,
        bytes: u64,
        link: Option<usize>,
    },
}

#[derive(Debug)]
struct Task {
    kind: TaskKind,
    waiting: usize,
    notify: Vec<usize>,
    /// Buffers released (one reference each) when this task finishes.
    reads: Vec<usize>,
    /// Buffers made resident when this task finishes.
    writes: Vec<usize>,
    start: u64,
}

#[derive(Debug)]
struct Buffer {
    device: usize,
    bytes: u64,
    refs: usize,
    resident: bool,
}

/// Identity of a buffer: (node, output, producer replica, device).
type BufferKey = (usize, usize, usize, usize);

#[derive(Default)]
struct TaskGraph {
    tasks: Vec<Task>,
    buffers: Vec<Buffer>,
    buffer_ids: BTreeMap<BufferKey, usize>,
}

impl TaskGraph {
    fn create(&mut self, kind: TaskKind, wait_for: &[usize], reads: Vec<usize>) -> usize {
        let id = self.tasks.len();
        for &dep in wait_for {
            self.tasks[dep].notify.push(id);
        }
        self.tasks.push(Task {
            kind,
            waiting: wait_for.len(),
            notify: Vec::new(),
            reads,
            writes: Vec::new(),
            start: 0,
        });
        id
    }

    /// Returns the buffer for `key`, growing it to at least `bytes`, and
    /// adds one reader reference.
    fn buffer(&mut self, key: BufferKey, bytes: u64) -> usize {
        let next = self.buffers.len();
        let id = *self.buffer_ids.entry(key).or_insert(next);
        if id == next {
            self.buffers.push(Buffer {
                device: key.3,
                bytes,
                refs: 0,
                resident: false,
            });
        }
        let buf = &mut self.buffers[id];
        buf.bytes = cmp::max(buf.bytes, bytes);
        buf.refs += 1;
        id
    }
}

#[derive(PartialEq, Eq)]
struct Ongoing {
    eft: u64,
    id: usize,
}

impl Ord for Ongoing {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap on finish time, ties broken by task id.
        other.eft.cmp(&self.eft).then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for Ongoing {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Producer pieces a consumer replica reads, as `(producer replica, bytes)`.
///
/// Pieces and slices are compared on a common grid of `m * k` units, where
/// `m` is the number of producer pieces and `k` the number of consumer
/// slices.
fn sources(producer: &Form, consumer: &Form, replica: usize, bytes: u64) -> Vec<(usize, u64)> {
    let device = consumer.placements[replica];
    let pieces: Vec<usize> = if producer.is_partitioned() {
        (0..producer.num_replicas()).collect()
    } else {
        vec![producer.replica_on(device).unwrap_or(0)]
    };
    let m = pieces.len() as u128;
    let (k, slice) = if consumer.is_partitioned() {
        (consumer.num_replicas() as u128, replica as u128)
    } else {
        (1, 0)
    };

    pieces
        .into_iter()
        .enumerate()
        .filter_map(|(i, producer_replica)| {
            let i = i as u128;
            let lo = cmp::max(i * k, slice * m);
            let hi = cmp::min((i + 1) * k, (slice + 1) * m);
            (hi > lo).then(|| {
                let share = u128::from(bytes) * (hi - lo) / (m * k);
                (producer_replica, share as u64)
            })
        })
        .collect()
}

// ── Simulation ─────────────────────────────────────────────────────

impl ListSimulator {
    pub fn new() -> Self {
        Self
    }

    /// Builds and runs the schedule for `request`.
    pub fn simulate(&self, request: &EvaluationRequest<'_>) -> Result<Schedule, EvaluationError> {
        let graph = &request.graph;
        let num_devices = request.devices.len();
        request.strategy.validate(graph, num_devices)?;

        let keep = if request.sinks.is_empty() {
            vec![true; graph.num_nodes()]
        } else {
            let roots = request
                .sinks
                .iter()
                .map(|s| graph.index_of(s).ok_or_else(|| EvaluationError::UnknownSink(s.clone())))
                .collect::<Result<Vec<_>, _>>()?;
            graph.ancestors_of(&roots)
        };

        let mut forms: Vec<Option<Form>> = vec![None; graph.num_nodes()];
        for (i, node) in graph.iter_nodes().enumerate() {
            if keep[i] {
                forms[i] = Some(request.strategy.form_for(&node.name, num_devices)?);
            }
        }

        let topology = LinkTopology::new(request.devices, request.bandwidth);
        let mut tg = TaskGraph::default();
        let mut compute_tasks: Vec<Vec<usize>> = vec![Vec::new(); graph.num_nodes()];

        for (i, node) in graph.iter_nodes().enumerate() {
            let Some(form) = forms[i].as_ref() else {
                continue;
            };
            let replicas = form.num_replicas();
            let mut deps: Vec<Vec<usize>> = vec![Vec::new(); replicas];
            let mut reads: Vec<Vec<usize>> = vec![Vec::new(); replicas];

            for edge in graph.inputs_of(i) {
                let p = edge.producer;
                let Some(pform) = forms[p].as_ref() else {
                    continue;
                };
                if edge.control {
                    for d in deps.iter_mut() {
                        d.extend_from_slice(&compute_tasks[p]);
                    }
                    continue;
                }

                let bytes = graph.edge_bytes(edge);
                let piece_bytes = if pform.is_partitioned() {
                    bytes / pform.num_replicas() as u64
                } else {
                    bytes
                };

                for r in 0..replicas {
                    let to = form.placements[r];
                    for (pr, share) in sources(pform, form, r, bytes) {
                        let from = pform.placements[pr];
                        let producer_task = compute_tasks[p][pr];
                        let src = tg.buffer((p, edge.output, pr, from), piece_bytes);
                        let dst = tg.buffer((p, edge.output, pr, to), share);
                        tg.tasks[producer_task].writes.push(src);

                        let transfer = tg.create(
                            TaskKind::Transfer {
                                producer: p,
                                consumer: i,
                                bytes: share,
                                link: topology.link_between(from, to),
                            },
                            &[producer_task],
                            vec![src],
                        );
                        tg.tasks[transfer].writes.push(dst);
                        deps[r].push(transfer);
                        reads[r].push(dst);
                    }
                }
            }

            let share = form.work_share();
            let ids = form
                .placements
                .iter()
                .enumerate()
                .map(|(r, &device)| {
                    let cost = request.cost_table.cost_of(&node.name, &node.op, device) * share;
                    let duration = if cost.is_finite() && cost > 0.0 { cost.round() as u64 } else { 0 };
                    tg.create(
                        TaskKind::Computation {
                            node: i,
                            device,
                            duration,
                        },
                        &deps[r],
                        std::mem::take(&mut reads[r]),
                    )
                })
                .collect();
            compute_tasks[i] = ids;
        }

        let nodes_simulated = keep.iter().filter(|&&k| k).count();
        let mut schedule = run(&mut tg, &topology, num_devices, request)?;
        schedule.nodes_simulated = nodes_simulated;
        Ok(schedule)
    }
}

fn run(
    tg: &mut TaskGraph,
    topology: &LinkTopology,
    num_devices: usize,
    request: &EvaluationRequest<'_>,
) -> Result<Schedule, EvaluationError> {
    let graph = &request.graph;
    let mut ready: VecDeque<usize> = (0..tg.tasks.len()).filter(|&i| tg.tasks[i].waiting == 0).collect();
    let mut ongoing = BinaryHeap::new();
    let mut device_free = vec![0u64; num_devices];
    let mut link_free = vec![0u64; topology.num_links()];
    let mut current = vec![0u64; num_devices];
    let mut peak = vec![0u64; num_devices];
    let mut timeline = Vec::new();
    let mut now = 0u64;
    let mut finished = 0usize;

    loop {
        while let Some(id) = ready.pop_front() {
            let (start, eft) = match tg.tasks[id].kind {
                TaskKind::Computation { device, duration, .. } => {
                    let start = cmp::max(device_free[device], now);
                    let eft = start.saturating_add(duration);
                    device_free[device] = eft;
                    (start, eft)
                }
                TaskKind::Transfer { bytes, link: Some(link), .. } => {
                    let bandwidth = topology.bandwidth_of(link).unwrap_or(1).max(1);
                    let start = cmp::max(link_free[link], now);
                    let eft = start
                        .saturating_add(bytes / bandwidth)
                        .saturating_add(TRANSFER_LATENCY_US);
                    link_free[link] = eft;
                    (start, eft)
                }
                TaskKind::Transfer { link: None, .. } => (now, now),
            };
            tg.tasks[id].start = start;
            ongoing.push(Ongoing { eft, id });
        }

        let Some(Ongoing { eft, id }) = ongoing.pop() else {
            break;
        };
        now = eft;
        finished += 1;

        for k in 0..tg.tasks[id].reads.len() {
            let buf = &mut tg.buffers[tg.tasks[id].reads[k]];
            buf.refs = buf.refs.saturating_sub(1);
            if buf.refs == 0 && buf.resident {
                buf.resident = false;
                current[buf.device] = current[buf.device].saturating_sub(buf.bytes);
            }
        }
        for k in 0..tg.tasks[id].writes.len() {
            let buf = &mut tg.buffers[tg.tasks[id].writes[k]];
            if !buf.resident && buf.refs > 0 {
                buf.resident = true;
                current[buf.device] = current[buf.device].saturating_add(buf.bytes);
                peak[buf.device] = cmp::max(peak[buf.device], current[buf.device]);
            }
        }

        let task = &tg.tasks[id];
        match task.kind {
            TaskKind::Computation { node, device, .. } => timeline.push(TraceEvent {
                name: graph.node(node).map(|n| n.name.clone()).unwrap_or_default(),
                category: TraceCategory::Computation,
                lane: device,
                start: task.start,
                end: eft,
            }),
            TaskKind::Transfer { producer, consumer, link: Some(link), .. } => {
                let name = |i: usize| graph.node(i).map_or("", |n| n.name.as_str());
                timeline.push(TraceEvent {
                    name: format!("{}->{}", name(producer), name(consumer)),
                    category: TraceCategory::Transfer,
                    lane: link,
                    start: task.start,
                    end: eft,
                });
            }
            TaskKind::Transfer { link: None, .. } => {}
        }

        for k in 0..tg.tasks[id].notify.len() {
            let next = tg.tasks[id].notify[k];
            let t = &mut tg.tasks[next];
            t.waiting -= 1;
            if t.waiting == 0 {
                ready.push_back(next);
            }
        }
    }

    if finished != tg.tasks.len() {
        return Err(EvaluationError::Stalled {
            finished,
            total: tg.tasks.len(),
        });
    }

    Ok(Schedule {
        makespan: now,
        peak_memory: peak,
        timeline,
        nodes_simulated: 0,
        tasks: tg.tasks.len(),
    })
}

impl StrategyEvaluator for ListSimulator {
    fn name(&self) -> &str {
        "list-scheduler"
    }

    fn evaluate(&self, request: EvaluationRequest<'_>) -> Result<Evaluation, EvaluationError> {
        let schedule = self.simulate(&request)?;
        tracing::debug!(
            nodes = schedule.nodes_simulated,
            tasks = schedule.tasks,
            makespan_us = schedule.makespan,
            "schedule simulated"
        );

        if let Some(path) = request.diagnostic_path {
            DiagnosticReport {
                strategy: request.strategy,
                makespan: schedule.makespan,
                peak_memory: &schedule.peak_memory,
                timeline: &schedule.timeline,
            }
            .write_best_effort(path);
        }

        Ok(Evaluation {
            time: schedule.makespan,
            peak_memory: schedule.peak_memory,
        })
    }
}
