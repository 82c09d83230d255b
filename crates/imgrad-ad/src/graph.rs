//! Static traced graphs for the image-gradient operators
//!
//! A [`StaticGraph`] is a straight-line program over a single input
//! placeholder. Every node is data-independent: shapes, padding, kernels and
//! scalars are fixed when the graph is built, so a graph recorded once can be
//! replayed on any input of a compatible shape.
//!
//! # Features
//!
//! - **Tracing**: [`trace_spatial_gradient`] and [`trace_sobel`] record the
//!   operators as graphs
//! - **Replay**: [`StaticGraph::run`] evaluates the graph
//! - **Reverse mode**: [`StaticGraph::vjp`] back-propagates a cotangent
//!   through the recorded nodes in reverse order
//!
//! # Example
//!
//! ```
//! use imgrad_ad::graph::trace_sobel;
//! use imgrad_core::DenseND;
//! use imgrad_kernels::{sobel, SobelConfig};
//!
//! let graph = trace_sobel::<f64>(&SobelConfig::default()).unwrap();
//!
//! let image = DenseND::<f64>::from_fn(&[2, 3, 4, 5], |i| (i[2] * 5 + i[3]) as f64 * 0.1);
//! let traced = graph.run(&image).unwrap();
//! let eager = sobel(&image).unwrap();
//! assert!(traced.max_abs_diff(&eager).unwrap() < 1e-5);
//! ```

use anyhow::{anyhow, Context, Result};
use imgrad_core::{DenseND, PaddingMode};
use imgrad_kernels::{FilterError, GradientConfig, SobelConfig};
use scirs2_core::numeric::Float;
use std::fmt;

/// Unique identifier for a node in a static graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.0)
    }
}

/// Identifier of a constant kernel stored in a graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KernelId(pub usize);

/// Operation recorded in a static graph
#[derive(Debug, Clone, PartialEq)]
pub enum GraphOp {
    /// The graph input (leaf node)
    Input,
    /// Pad the two trailing axes: z = pad2d(x, pad, mode)
    Pad2d {
        input: NodeId,
        pad: usize,
        mode: PaddingMode,
    },
    /// Depthwise valid cross-correlation with a constant kernel
    Correlate2d { input: NodeId, kernel: KernelId },
    /// Stack along a new axis
    Stack { inputs: Vec<NodeId>, axis: usize },
    /// Select one index of an axis, removing it
    Select {
        input: NodeId,
        axis: usize,
        index: usize,
    },
    /// Element-wise square: z = x²
    Square { input: NodeId },
    /// Element-wise addition: z = x + y
    Add { lhs: NodeId, rhs: NodeId },
    /// Add a constant: z = x + c
    AddScalar { input: NodeId, value: f64 },
    /// Element-wise square root: z = √x
    Sqrt { input: NodeId },
    /// Multiply by a constant: z = c · x
    Scale { input: NodeId, factor: f64 },
}

impl GraphOp {
    /// Nodes this operation reads from
    pub fn inputs(&self) -> Vec<NodeId> {
        match self {
            GraphOp::Input => Vec::new(),
            GraphOp::Stack { inputs, .. } => inputs.clone(),
            GraphOp::Add { lhs, rhs } => vec![*lhs, *rhs],
            GraphOp::Pad2d { input, .. }
            | GraphOp::Correlate2d { input, .. }
            | GraphOp::Select { input, .. }
            | GraphOp::Square { input }
            | GraphOp::AddScalar { input, .. }
            | GraphOp::Sqrt { input }
            | GraphOp::Scale { input, .. } => vec![*input],
        }
    }
}

/// Image contract checked on the input before a traced operator runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInput {
    /// Operation name carried by the resulting [`FilterError`]
    pub operation: &'static str,
    pub gradient: GradientConfig,
}

/// Straight-line computation graph with a single input and output
///
/// Nodes are stored in insertion order, which is a topological order since
/// every node may only read from earlier nodes.
#[derive(Debug, Clone)]
pub struct StaticGraph<T> {
    nodes: Vec<GraphOp>,
    kernels: Vec<DenseND<T>>,
    input: NodeId,
    output: NodeId,
    image_input: Option<ImageInput>,
}

impl<T> Default for StaticGraph<T>
where
    T: Float + Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> StaticGraph<T>
where
    T: Float + Send + Sync,
{
    /// Create a graph holding only the input placeholder, which is also its
    /// output until [`set_output`](Self::set_output) is called.
    pub fn new() -> Self {
        Self {
            nodes: vec![GraphOp::Input],
            kernels: Vec::new(),
            input: NodeId(0),
            output: NodeId(0),
            image_input: None,
        }
    }

    /// Require every input to be an image accepted by `gradient`.
    ///
    /// [`run`](Self::run) and [`vjp`](Self::vjp) then fail with the same
    /// [`FilterError`] the eager operator named `operation` would return,
    /// before any node is evaluated.
    pub fn require_image(&mut self, operation: &'static str, gradient: GradientConfig) {
        self.image_input = Some(ImageInput {
            operation,
            gradient,
        });
    }

    /// The input contract set by [`require_image`](Self::require_image)
    pub fn image_input(&self) -> Option<&ImageInput> {
        self.image_input.as_ref()
    }

    /// The input placeholder
    pub fn input(&self) -> NodeId {
        self.input
    }

    /// The node returned by [`run`](Self::run)
    pub fn output(&self) -> NodeId {
        self.output
    }

    /// Recorded operations in evaluation order
    pub fn nodes(&self) -> &[GraphOp] {
        &self.nodes
    }

    /// Number of recorded nodes, including the input
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Mark `node` as the graph output
    pub fn set_output(&mut self, node: NodeId) -> Result<()> {
        self.check_node(node)?;
        self.output = node;
        Ok(())
    }

    /// Record `pad2d(x, pad, mode)`
    pub fn pad2d(&mut self, input: NodeId, pad: usize, mode: PaddingMode) -> Result<NodeId> {
        self.push(GraphOp::Pad2d { input, pad, mode })
    }

    /// Record a correlation with a constant 2D kernel
    pub fn correlate2d(&mut self, input: NodeId, kernel: DenseND<T>) -> Result<NodeId> {
        anyhow::ensure!(
            kernel.rank() == 2,
            "Kernel must be 2D, got rank {}",
            kernel.rank()
        );
        let kernel_id = KernelId(self.kernels.len());
        self.kernels.push(kernel);
        self.push(GraphOp::Correlate2d {
            input,
            kernel: kernel_id,
        })
    }

    /// Record a stack of `inputs` along a new `axis`
    pub fn stack(&mut self, inputs: &[NodeId], axis: usize) -> Result<NodeId> {
        anyhow::ensure!(!inputs.is_empty(), "Cannot stack empty node list");
        self.push(GraphOp::Stack {
            inputs: inputs.to_vec(),
            axis,
        })
    }

    /// Record the selection of `index` along `axis`
    pub fn select(&mut self, input: NodeId, axis: usize, index: usize) -> Result<NodeId> {
        self.push(GraphOp::Select { input, axis, index })
    }

    /// Record `x²`
    pub fn square(&mut self, input: NodeId) -> Result<NodeId> {
        self.push(GraphOp::Square { input })
    }

    /// Record `x + y`
    pub fn add(&mut self, lhs: NodeId, rhs: NodeId) -> Result<NodeId> {
        self.push(GraphOp::Add { lhs, rhs })
    }

    /// Record `x + value`
    pub fn add_scalar(&mut self, input: NodeId, value: f64) -> Result<NodeId> {
        self.push(GraphOp::AddScalar { input, value })
    }

    /// Record `√x`
    pub fn sqrt(&mut self, input: NodeId) -> Result<NodeId> {
        self.push(GraphOp::Sqrt { input })
    }

    /// Record `factor · x`
    pub fn scale(&mut self, input: NodeId, factor: f64) -> Result<NodeId> {
        self.push(GraphOp::Scale { input, factor })
    }

    /// Replay the graph on `input`.
    #[tracing::instrument(level = "debug", skip_all, fields(nodes = self.nodes.len(), shape = ?input.shape()))]
    pub fn run(&self, input: &DenseND<T>) -> Result<DenseND<T>> {
        self.check_input(input)?;
        let mut values = self.forward(input)?;
        values
            .swap_remove(self.output.0)
            .ok_or_else(|| anyhow!("{} was never evaluated", self.output))
    }

    /// Back-propagate `grad_output` (∂L/∂output) to the input.
    ///
    /// Evaluates the forward pass on `input` first, keeping every
    /// intermediate value, then walks the nodes in reverse order.
    #[tracing::instrument(level = "debug", skip_all, fields(nodes = self.nodes.len(), shape = ?input.shape()))]
    pub fn vjp(&self, input: &DenseND<T>, grad_output: &DenseND<T>) -> Result<DenseND<T>> {
        self.check_input(input)?;
        let values = self.forward(input)?;
        let output_value = value_of(&values, self.output)?;
        if output_value.shape() != grad_output.shape() {
            return Err(FilterError::ShapeMismatch {
                operation: "StaticGraph::vjp",
                expected: output_value.shape_vec(),
                actual: grad_output.shape_vec(),
            }
            .into());
        }

        let mut grads: Vec<Option<DenseND<T>>> = vec![None; self.nodes.len()];
        grads[self.output.0] = Some(grad_output.clone());

        for id in (0..=self.output.0).rev() {
            let Some(grad) = grads[id].take() else {
                continue;
            };
            if NodeId(id) == self.input {
                grads[id] = Some(grad);
                continue;
            }
            self.backward_node(NodeId(id), &grad, &values, &mut grads)
                .with_context(|| format!("back-propagating through {}", NodeId(id)))?;
        }

        match grads[self.input.0].take() {
            Some(grad) => Ok(grad),
            // Output does not depend on the input
            None => Ok(DenseND::zeros(input.shape())),
        }
    }

    fn check_input(&self, input: &DenseND<T>) -> Result<()> {
        if let Some(image) = &self.image_input {
            image
                .gradient
                .validate_image(image.operation, input.shape())?;
        }
        Ok(())
    }

    fn push(&mut self, op: GraphOp) -> Result<NodeId> {
        for parent in op.inputs() {
            self.check_node(parent)?;
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(op);
        Ok(id)
    }

    fn check_node(&self, node: NodeId) -> Result<()> {
        anyhow::ensure!(
            node.0 < self.nodes.len(),
            "{} does not exist in a graph of {} nodes",
            node,
            self.nodes.len()
        );
        Ok(())
    }

    fn kernel(&self, kernel: KernelId) -> Result<&DenseND<T>> {
        self.kernels
            .get(kernel.0)
            .ok_or_else(|| anyhow!("Kernel {} does not exist", kernel.0))
    }

    fn forward(&self, input: &DenseND<T>) -> Result<Vec<Option<DenseND<T>>>> {
        let mut values: Vec<Option<DenseND<T>>> = Vec::with_capacity(self.nodes.len());
        for (id, op) in self.nodes.iter().enumerate() {
            let value = self
                .eval_node(op, input, &values)
                .with_context(|| format!("evaluating {}", NodeId(id)))?;
            values.push(Some(value));
        }
        Ok(values)
    }

    fn eval_node(
        &self,
        op: &GraphOp,
        input: &DenseND<T>,
        values: &[Option<DenseND<T>>],
    ) -> Result<DenseND<T>> {
        let value = match op {
            GraphOp::Input => input.clone(),
            GraphOp::Pad2d { input, pad, mode } => value_of(values, *input)?.pad2d(*pad, *mode)?,
            GraphOp::Correlate2d { input, kernel } => {
                value_of(values, *input)?.depthwise_correlate2d(self.kernel(*kernel)?)?
            }
            GraphOp::Stack { inputs, axis } => {
                let parts = inputs
                    .iter()
                    .map(|id| value_of(values, *id).cloned())
                    .collect::<Result<Vec<_>>>()?;
                DenseND::stack(&parts, *axis)?
            }
            GraphOp::Select { input, axis, index } => {
                value_of(values, *input)?.index_axis(*axis, *index)?
            }
            GraphOp::Square { input } => value_of(values, *input)?.square(),
            GraphOp::Add { lhs, rhs } => value_of(values, *lhs)?.add(value_of(values, *rhs)?)?,
            GraphOp::AddScalar { input, value } => {
                value_of(values, *input)?.add_scalar(scalar(*value)?)
            }
            GraphOp::Sqrt { input } => value_of(values, *input)?.sqrt(),
            GraphOp::Scale { input, factor } => {
                value_of(values, *input)?.scalar_mul(scalar(*factor)?)
            }
        };
        Ok(value)
    }

    fn backward_node(
        &self,
        id: NodeId,
        grad: &DenseND<T>,
        values: &[Option<DenseND<T>>],
        grads: &mut [Option<DenseND<T>>],
    ) -> Result<()> {
        match &self.nodes[id.0] {
            GraphOp::Input => {}
            GraphOp::Pad2d { input, pad, mode } => {
                accumulate(grads, *input, grad.pad2d_adjoint(*pad, *mode)?)?;
            }
            GraphOp::Correlate2d { input, kernel } => {
                let grad_in = grad.depthwise_correlate2d_adjoint(self.kernel(*kernel)?)?;
                accumulate(grads, *input, grad_in)?;
            }
            GraphOp::Stack { inputs, axis } => {
                for (i, parent) in inputs.iter().enumerate() {
                    accumulate(grads, *parent, grad.index_axis(*axis, i)?)?;
                }
            }
            GraphOp::Select { input, axis, index } => {
                let extent = value_of(values, *input)?.shape()[*axis];
                let zeros = DenseND::zeros(grad.shape());
                let parts: Vec<DenseND<T>> = (0..extent)
                    .map(|i| if i == *index { grad.clone() } else { zeros.clone() })
                    .collect();
                accumulate(grads, *input, DenseND::stack(&parts, *axis)?)?;
            }
            GraphOp::Square { input } => {
                let x = value_of(values, *input)?;
                let two = scalar::<T>(2.0)?;
                accumulate(grads, *input, grad.mul(&x.scalar_mul(two))?)?;
            }
            GraphOp::Add { lhs, rhs } => {
                accumulate(grads, *lhs, grad.clone())?;
                accumulate(grads, *rhs, grad.clone())?;
            }
            GraphOp::AddScalar { input, .. } => {
                accumulate(grads, *input, grad.clone())?;
            }
            GraphOp::Sqrt { input } => {
                // d√x/dx = 1 / (2√x), reusing the forward output
                let y = value_of(values, id)?;
                let two = scalar::<T>(2.0)?;
                accumulate(grads, *input, grad.div(&y.scalar_mul(two))?)?;
            }
            GraphOp::Scale { input, factor } => {
                accumulate(grads, *input, grad.scalar_mul(scalar(*factor)?))?;
            }
        }
        Ok(())
    }
}

/// Record [`imgrad_kernels::spatial_gradient_with`] as a static graph.
///
/// The graph is `input -> pad -> {correlate(gx), correlate(gy)} -> stack`.
pub fn trace_spatial_gradient<T>(config: &GradientConfig) -> Result<StaticGraph<T>>
where
    T: Float + Send + Sync,
{
    let mut graph = StaticGraph::new();
    graph.require_image("spatial_gradient", *config);
    let x = graph.input();
    let (dx, dy) = trace_gradient_planes(&mut graph, x, config)?;
    let out = graph.stack(&[dx, dy], 2)?;
    graph.set_output(out)?;
    tracing::debug!(nodes = graph.len(), "traced spatial_gradient");
    Ok(graph)
}

/// Record [`imgrad_kernels::sobel_with`] as a static graph.
///
/// Extends the spatial-gradient trace with `sqrt(dx² + dy² + eps)`.
pub fn trace_sobel<T>(config: &SobelConfig) -> Result<StaticGraph<T>>
where
    T: Float + Send + Sync,
{
    config.validate()?;

    let mut graph = StaticGraph::new();
    graph.require_image("sobel", config.gradient);
    let x = graph.input();
    let (dx, dy) = trace_gradient_planes(&mut graph, x, &config.gradient)?;
    let dx2 = graph.square(dx)?;
    let dy2 = graph.square(dy)?;
    let sum = graph.add(dx2, dy2)?;
    let stabilized = graph.add_scalar(sum, config.eps)?;
    let out = graph.sqrt(stabilized)?;
    graph.set_output(out)?;
    tracing::debug!(nodes = graph.len(), "traced sobel");
    Ok(graph)
}

fn trace_gradient_planes<T>(
    graph: &mut StaticGraph<T>,
    x: NodeId,
    config: &GradientConfig,
) -> Result<(NodeId, NodeId)>
where
    T: Float + Send + Sync,
{
    let kernels = config.kernels::<T>()?;
    let padded = graph.pad2d(x, 1, config.padding)?;
    let dx = graph.correlate2d(padded, kernels.gx)?;
    let dy = graph.correlate2d(padded, kernels.gy)?;
    Ok((dx, dy))
}

fn value_of<T>(values: &[Option<DenseND<T>>], id: NodeId) -> Result<&DenseND<T>> {
    values
        .get(id.0)
        .and_then(Option::as_ref)
        .ok_or_else(|| anyhow!("{} has no value", id))
}

fn accumulate<T: Float>(
    grads: &mut [Option<DenseND<T>>],
    id: NodeId,
    grad: DenseND<T>,
) -> Result<()> {
    let slot = grads
        .get_mut(id.0)
        .ok_or_else(|| anyhow!("{} does not exist", id))?;
    *slot = Some(match slot.take() {
        Some(existing) => existing.add(&grad)?,
        None => grad,
    });
    Ok(())
}

fn scalar<T: Float>(value: f64) -> Result<T> {
    T::from(value).ok_or_else(|| anyhow!("Failed to convert constant {}", value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use imgrad_kernels::{sobel_backward, sobel_with, spatial_gradient_backward, spatial_gradient_with};

    fn ramp(shape: &[usize]) -> DenseND<f64> {
        DenseND::from_fn(shape, |i| {
            let v: usize = i.iter().enumerate().map(|(k, &x)| (k + 2) * x * x).sum();
            (v % 17) as f64 * 0.25
        })
    }

    #[test]
    fn test_trace_spatial_gradient_structure() {
        let graph = trace_spatial_gradient::<f64>(&GradientConfig::default()).unwrap();
        assert_eq!(graph.len(), 5);
        assert_eq!(graph.nodes()[0], GraphOp::Input);
        assert!(matches!(graph.nodes()[4], GraphOp::Stack { axis: 2, .. }));
        assert_eq!(graph.output(), NodeId(4));
    }

    #[test]
    fn test_trace_spatial_gradient_matches_eager() {
        let config = GradientConfig::default().with_padding(PaddingMode::Reflect);
        let graph = trace_spatial_gradient::<f64>(&config).unwrap();
        let x = ramp(&[2, 2, 4, 5]);
        let traced = graph.run(&x).unwrap();
        let eager = spatial_gradient_with(&x, &config).unwrap();
        assert_eq!(traced, eager);
    }

    #[test]
    fn test_graph_vjp_matches_hand_written_backward() {
        let x = ramp(&[1, 2, 4, 4]);

        let config = GradientConfig::default();
        let graph = trace_spatial_gradient::<f64>(&config).unwrap();
        let g = ramp(&[1, 2, 2, 4, 4]);
        let traced = graph.vjp(&x, &g).unwrap();
        let direct = spatial_gradient_backward(&g, &config).unwrap();
        assert!(traced.max_abs_diff(&direct).unwrap() < 1e-12);

        let sobel_config = SobelConfig::default();
        let graph = trace_sobel::<f64>(&sobel_config).unwrap();
        let g = ramp(&[1, 2, 4, 4]);
        let traced = graph.vjp(&x, &g).unwrap();
        let direct = sobel_backward(&x, &g, &sobel_config).unwrap();
        assert!(traced.max_abs_diff(&direct).unwrap() < 1e-9);
    }

    #[test]
    fn test_select_and_scale_backward() {
        // out = 3 * x[:, 1]
        let mut graph = StaticGraph::<f64>::new();
        let x = graph.input();
        let col = graph.select(x, 1, 1).unwrap();
        let out = graph.scale(col, 3.0).unwrap();
        graph.set_output(out).unwrap();

        let input = DenseND::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
        assert_eq!(graph.run(&input).unwrap().to_vec(), vec![6.0, 15.0]);

        let grad = graph.vjp(&input, &DenseND::ones(&[2])).unwrap();
        assert_eq!(grad.to_vec(), vec![0.0, 3.0, 0.0, 0.0, 3.0, 0.0]);
    }

    #[test]
    fn test_shared_node_accumulates_gradient() {
        // out = x + x
        let mut graph = StaticGraph::<f64>::new();
        let x = graph.input();
        let out = graph.add(x, x).unwrap();
        graph.set_output(out).unwrap();

        let input = DenseND::from_vec(vec![1.0, -1.0], &[2]).unwrap();
        let grad = graph.vjp(&input, &DenseND::ones(&[2])).unwrap();
        assert_eq!(grad.to_vec(), vec![2.0, 2.0]);
    }

    #[test]
    fn test_builder_rejects_unknown_nodes() {
        let mut graph = StaticGraph::<f64>::new();
        assert!(graph.square(NodeId(3)).is_err());
        assert!(graph.set_output(NodeId(1)).is_err());
        assert!(graph.stack(&[], 0).is_err());
    }

    #[test]
    fn test_run_reports_failing_node() {
        // out = x[:, 3] on a graph without an image contract
        let mut graph = StaticGraph::<f64>::new();
        let x = graph.input();
        let out = graph.select(x, 1, 3).unwrap();
        graph.set_output(out).unwrap();
        let err = graph.run(&DenseND::zeros(&[2, 2])).unwrap_err();
        assert!(format!("{:#}", err).contains("Node(1)"));
    }

    #[test]
    fn test_traced_rank_error_matches_eager() {
        let config = GradientConfig::default();
        let x = DenseND::<f64>::zeros(&[3, 4, 4]);
        let eager = spatial_gradient_with(&x, &config).unwrap_err();

        let graph = trace_spatial_gradient::<f64>(&config).unwrap();
        let traced = graph.run(&x).unwrap_err();
        assert_eq!(traced.downcast_ref::<FilterError>(), Some(&eager));
        assert!(matches!(
            eager,
            FilterError::Shape { operation: "spatial_gradient", expected_rank: 4, .. }
        ));

        let traced = graph.vjp(&x, &DenseND::zeros(&[3, 2, 4, 4])).unwrap_err();
        assert_eq!(traced.downcast_ref::<FilterError>(), Some(&eager));
    }

    #[test]
    fn test_traced_reflect_extent_error_matches_eager() {
        let config = SobelConfig::default()
            .with_gradient(GradientConfig::default().with_padding(PaddingMode::Reflect));
        let x = DenseND::<f64>::zeros(&[1, 1, 1, 4]);
        let eager = sobel_with(&x, &config).unwrap_err();
        assert!(matches!(eager, FilterError::InvalidConfig { parameter: "padding", .. }));

        let graph = trace_sobel::<f64>(&config).unwrap();
        let traced = graph.run(&x).unwrap_err();
        assert_eq!(traced.downcast_ref::<FilterError>(), Some(&eager));
        assert_eq!(graph.image_input().map(|image| image.operation), Some("sobel"));
    }

    #[test]
    fn test_vjp_rejects_mismatched_cotangent() {
        let graph = trace_sobel::<f64>(&SobelConfig::default()).unwrap();
        let x = ramp(&[1, 1, 4, 4]);
        let err = graph.vjp(&x, &DenseND::ones(&[1, 1, 3, 3])).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FilterError>(),
            Some(FilterError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_trace_sobel_rejects_negative_eps() {
        let config = SobelConfig::default().with_eps(-1.0);
        assert!(trace_sobel::<f64>(&config).is_err());
    }
}
