//! Cart pricing. Pure functions over server-trusted unit prices.

use super::money::Money;
use super::order::OrderLine;

/// Sum of `unit_price * quantity` over all lines, exact to the cent.
pub fn total(lines: &[OrderLine]) -> Money {
    lines.iter().map(OrderLine::line_total).sum()
}
