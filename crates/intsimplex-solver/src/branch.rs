//! Branch-and-bound over an arena of nodes.
//!
//! Each node records the single bound that separates it from its parent.
//! A node's model is the root model plus the bounds along its path, so the
//! lineage is recovered by walking parent indices.

use std::cmp::Ordering;

use log::debug;

use crate::problem::{ConstraintOp, Model, Sense};
use crate::simplex::Solver;
use crate::solution::{Solution, SolveError};

/// Index of a node in the branch arena
pub type NodeId = usize;

/// Bound added to a parent's model to derive a child
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Branch {
    /// Decision variable being restricted
    pub column: usize,
    /// `Le` for the floor child, `Ge` for the ceiling child
    pub op: ConstraintOp,
    pub bound: f64,
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    branch: Option<Branch>,
    solution: Solution,
}

/// Counters describing one branch-and-bound run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BranchStats {
    /// Branching rounds performed
    pub rounds: usize,
    /// Nodes kept in the arena, root included
    pub nodes: usize,
    /// Children discarded as infeasible, impossible or degenerate
    pub pruned: usize,
}

pub(crate) struct BranchAndBound<'a> {
    solver: &'a Solver,
    root: &'a Model,
    sense: Sense,
    nodes: Vec<Node>,
    stats: BranchStats,
}

impl<'a> BranchAndBound<'a> {
    pub(crate) fn new(solver: &'a Solver, root: &'a Model, sense: Sense) -> Self {
        Self {
            solver,
            root,
            sense,
            nodes: Vec::new(),
            stats: BranchStats::default(),
        }
    }

    /// Solve the root relaxation, then keep branching from the incumbent
    /// until its decision variables are all integral.
    pub(crate) fn run(mut self) -> Result<(Solution, BranchStats), SolveError> {
        let root_solution = self.solver.solve_lp(self.root, self.sense)?;
        debug!("root relaxation: obj.: {}", root_solution.objective_value);
        let mut incumbent = self.push(None, None, root_solution);

        while !self.is_integral(incumbent) {
            incumbent = self.step(incumbent)?;
        }

        self.stats.nodes = self.nodes.len();
        debug!(
            "integer optimum after {} rounds, {} nodes ({} pruned), obj.: {}",
            self.stats.rounds,
            self.stats.nodes,
            self.stats.pruned,
            self.nodes[incumbent].solution.objective_value
        );
        let solution = self.nodes.swap_remove(incumbent).solution;
        Ok((solution, self.stats))
    }

    /// One branching round: expand the incumbent and pick its successor.
    fn step(&mut self, incumbent: NodeId) -> Result<NodeId, SolveError> {
        self.stats.rounds += 1;
        let children = self.expand(incumbent)?;
        debug!(
            "round {}: {} surviving children of node {} (obj.: {})",
            self.stats.rounds,
            children.len(),
            incumbent,
            self.nodes[incumbent].solution.objective_value
        );
        self.select(&children).ok_or(SolveError::NoIntegerSolution)
    }

    /// Solve a floor and a ceiling child for every fractional decision
    /// variable of `parent`, returning the children that survive pruning.
    fn expand(&mut self, parent: NodeId) -> Result<Vec<NodeId>, SolveError> {
        let model = self.model_for(parent);
        let parent_key = self.key(parent);
        let fractional: Vec<(usize, f64)> = self.nodes[parent]
            .solution
            .values()
            .iter()
            .copied()
            .enumerate()
            .filter(|&(_, v)| has_fraction(v, self.solver.integrality_tolerance()))
            .collect();

        let mut survivors = Vec::new();
        for (column, value) in fractional {
            let branches = [
                Branch { column, op: ConstraintOp::Le, bound: value.floor() },
                Branch { column, op: ConstraintOp::Ge, bound: value.ceil() },
            ];
            for branch in branches {
                let child = model.with_bound(branch.column, branch.op, branch.bound);
                let solution = match self.solver.solve_lp(&child, self.sense) {
                    Ok(solution) => solution,
                    Err(SolveError::Infeasible) => {
                        debug!("pruned {:?}: infeasible", branch);
                        self.stats.pruned += 1;
                        continue;
                    }
                    Err(err) => return Err(err),
                };

                let child_key = self.sense.to_maximize_form(solution.objective_value);
                if child_key > parent_key + self.solver.tolerance() {
                    debug!("pruned {:?}: obj. {} beats its relaxation", branch, solution.objective_value);
                    self.stats.pruned += 1;
                    continue;
                }
                // also drops a genuine zero optimum
                if solution.objective_value == 0.0 {
                    debug!("pruned {:?}: zero objective", branch);
                    self.stats.pruned += 1;
                    continue;
                }

                survivors.push(self.push(Some(parent), Some(branch), solution));
            }
        }

        Ok(survivors)
    }

    /// Best child by objective, preferring an integral plan and then an
    /// integral objective value.
    fn select(&self, children: &[NodeId]) -> Option<NodeId> {
        let mut ranked = children.to_vec();
        ranked.sort_by(|&a, &b| self.key(b).partial_cmp(&self.key(a)).unwrap_or(Ordering::Equal));

        let tol = self.solver.integrality_tolerance();
        let integral: Vec<NodeId> = ranked.iter().copied().filter(|&id| self.is_integral(id)).collect();

        integral
            .iter()
            .copied()
            .find(|&id| !has_fraction(self.nodes[id].solution.objective_value, tol))
            .or_else(|| integral.first().copied())
            .or_else(|| ranked.first().copied())
    }

    /// Rebuild the model a node was solved with: the root plus every bound
    /// on the path from the root down to the node.
    fn model_for(&self, id: NodeId) -> Model {
        let mut path = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = &self.nodes[node_id];
            if let Some(branch) = node.branch {
                path.push(branch);
            }
            current = node.parent;
        }

        path.iter()
            .rev()
            .fold(self.root.clone(), |model, b| model.with_bound(b.column, b.op, b.bound))
    }

    fn push(&mut self, parent: Option<NodeId>, branch: Option<Branch>, solution: Solution) -> NodeId {
        self.nodes.push(Node { parent, branch, solution });
        self.nodes.len() - 1
    }

    /// Objective in maximize form, so larger is always better
    fn key(&self, id: NodeId) -> f64 {
        self.sense.to_maximize_form(self.nodes[id].solution.objective_value)
    }

    fn is_integral(&self, id: NodeId) -> bool {
        let tol = self.solver.integrality_tolerance();
        !self.nodes[id].solution.values().iter().any(|&v| has_fraction(v, tol))
    }
}

/// Whether `value` is further than `tolerance` from the nearest integer
pub(crate) fn has_fraction(value: f64, tolerance: f64) -> bool {
    let magnitude = value.abs();
    let fraction = magnitude - magnitude.floor();
    fraction > tolerance && 1.0 - fraction > tolerance
}
