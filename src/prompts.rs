//! The comparison rubric sent to the vision model.
//!
//! Centralising the prompt here serves two purposes:
//!
//! 1. **Single source of truth** — the six parameters and their weights are
//!    the product definition of "similarity"; changing them requires editing
//!    exactly one place.
//!
//! 2. **Testability** — unit tests can inspect the rubric and the HTTP layer
//!    can assert it was transmitted, without calling a real model.
//!
//! The rubric is fixed per comparison. Callers pick the model and sampling
//! knobs via [`crate::config::CompareConfig`], never the prompt text.

/// The weighted six-parameter rubric for dashboard comparison.
///
/// Weights sum to 100%, with text-related differences weighted heaviest.
/// The model is asked for per-parameter scores out of 100 plus a weighted
/// overall score; the reply is displayed verbatim, so the rubric also fixes
/// the shape of the verdict the user sees.
pub const COMPARISON_RUBRIC: &str = r#"Compare these two dashboard images based on the following parameters:
1. **Text Similarity** (30% Weight): Identify changes such as text additions, reductions, format changes, or value replacements. Even minor changes should significantly impact the score.
2. **Numerical Data Accuracy** (20% Weight): Detect differences in key metrics, KPIs, and numerical values. Even slight shifts in data values should notably reduce the similarity score.
3. **Layout Structure** (10% Weight): Assess differences in element positioning, alignment, spacing, and visual organization. Slight adjustments should moderately impact the score.
4. **Color Scheme Similarity** (10% Weight): Identify variations in color themes, additions, reductions, or subtle hue changes. Minor changes should reduce the score proportionately.
5. **Graph Design** (20% Weight): Evaluate changes in graph types, axis labeling, data visualization, and design consistency. Minor adjustments should have a smaller impact on the score.
6. **Font Style Consistency** (10% Weight): Assess variations in font type, size, or clarity. Slight changes should contribute minimally to the overall reduction in similarity.
Assign the highest impact to text-related differences, followed by numerical data, layout structure, and other visual aspects.
Provide individual similarity scores out of 100 for each parameter, along with a weighted overall similarity score."#;
