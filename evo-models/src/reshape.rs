use evo_core::error::{EvoError, Result};
use evo_core::model::ParamShapes;

fn block_len(shape: &[usize]) -> usize {
    shape.iter().product()
}

/// Concatenates parameter blocks into one flat vector, in order
pub fn flatten<B: AsRef<[f32]>>(blocks: &[B]) -> Vec<f32> {
    let total = blocks.iter().map(|b| b.as_ref().len()).sum();
    let mut out = Vec::with_capacity(total);
    for b in blocks {
        out.extend_from_slice(b.as_ref());
    }
    out
}

/// Splits `params` into one slice per entry of `shapes`.  Blocks are laid
/// out back to back in row-major order; the total length must match exactly.
pub fn unflatten<'a>(params: &'a [f32], shapes: &ParamShapes) -> Result<Vec<&'a [f32]>> {
    let expected: usize = shapes.iter().map(|(_, s)| block_len(s)).sum();
    if params.len() != expected {
        return Err(EvoError::ShapeMismatch {
            expected: expected,
            got: params.len(),
        });
    }

    let mut blocks = Vec::with_capacity(shapes.len());
    let mut rest = params;
    for (_, shape) in shapes {
        let (head, tail) = rest.split_at(block_len(shape));
        blocks.push(head);
        rest = tail;
    }
    Ok(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shapes() -> ParamShapes {
        vec![
            ("w".to_string(), vec![2, 3]),
            ("b".to_string(), vec![2]),
            ("scale".to_string(), vec![]),
        ]
    }

    #[test]
    fn test_unflatten_splits_in_order() {
        let params: Vec<f32> = (0..9).map(|i| i as f32).collect();
        let blocks = unflatten(&params, &shapes()).unwrap();
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0], &[0., 1., 2., 3., 4., 5.]);
        assert_eq!(blocks[1], &[6., 7.]);
        // an empty shape is a scalar
        assert_eq!(blocks[2], &[8.]);
        assert_eq!(flatten(&blocks), params);
    }

    #[test]
    fn test_unflatten_rejects_wrong_length() {
        match unflatten(&[0.; 8], &shapes()) {
            Err(EvoError::ShapeMismatch { expected, got }) => assert_eq!((expected, got), (9, 8)),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
