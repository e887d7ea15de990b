use rust_decimal::{Decimal, RoundingStrategy};

use crate::domain::order::{LineItem, PieceDraft};

/// Square millimetres in one billing quarter (0.25 m²).
const QUARTER_M2_IN_MM2: u128 = 250_000;

/// Billed area for `quantity` pieces of `height_mm` x `width_mm`, rounded up to the next
/// quarter square metre. Computed on integers so the result is exact; saturates at
/// `Decimal::MAX`.
pub fn billed_area_m2(height_mm: u32, width_mm: u32, quantity: u32) -> Decimal {
    let area_mm2 = u128::from(height_mm) * u128::from(width_mm) * u128::from(quantity);
    let quarters = area_mm2.div_ceil(QUARTER_M2_IN_MM2);
    i128::try_from(quarters)
        .ok()
        .and_then(|quarters| quarters.checked_mul(25))
        .and_then(|hundredths| Decimal::try_from_i128_with_scale(hundredths, 2).ok())
        .unwrap_or(Decimal::MAX)
}

pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Prices every piece at `price_per_m2`. Each line total is rounded to cents; the grand
/// total is the sum of rounded line totals.
pub fn price_pieces(pieces: &[PieceDraft], price_per_m2: Decimal) -> (Vec<LineItem>, Decimal) {
    let lines: Vec<LineItem> = pieces
        .iter()
        .map(|piece| {
            let area_m2 = billed_area_m2(piece.height_mm, piece.width_mm, piece.quantity);
            LineItem {
                piece_name: piece.name.clone(),
                quantity: piece.quantity,
                height_mm: piece.height_mm,
                width_mm: piece.width_mm,
                area_m2,
                unit_price: price_per_m2,
                total: round_money(area_m2.checked_mul(price_per_m2).unwrap_or(Decimal::MAX)),
            }
        })
        .collect();
    let total = lines
        .iter()
        .try_fold(Decimal::ZERO, |sum, line| sum.checked_add(line.total))
        .unwrap_or(Decimal::MAX);
    (lines, total)
}
