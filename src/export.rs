//! Grayscale export of a field readback.

use image::GrayImage;

use crate::{FieldError, Result, SceneParameters};

/// Map the first `width * height` cells to 8-bit luminance, `value * 255`
/// saturated to `[0, 255]`.
pub fn to_gray_image(params: &SceneParameters, cells: &[f32]) -> Result<GrayImage> {
    let required = params.cell_count();
    let too_small = FieldError::OutputTooSmall {
        required,
        actual: cells.len(),
    };
    if cells.len() < required {
        return Err(too_small);
    }
    let luma = cells[..required]
        .iter()
        .map(|&v| (255.0 * v) as u8)
        .collect::<Vec<_>>();
    GrayImage::from_vec(params.width, params.height, luma).ok_or(too_small)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_half_maps_to_mid_gray() {
        let params = SceneParameters::new(3, 2);
        let image = to_gray_image(&params, &[0.5; 8]).unwrap();
        assert_eq!(image.dimensions(), (3, 2));
        assert!(image.pixels().all(|p| p.0 == [127]));
    }

    #[test]
    fn out_of_range_values_saturate() {
        let params = SceneParameters::new(2, 1);
        let image = to_gray_image(&params, &[-1.0, 7.0]).unwrap();
        assert_eq!(image.as_raw(), &[0, 255]);
    }

    #[test]
    fn short_readback_is_rejected() {
        let params = SceneParameters::new(4, 4);
        assert!(matches!(
            to_gray_image(&params, &[0.5; 15]),
            Err(FieldError::OutputTooSmall { required: 16, actual: 15 })
        ));
    }
}
