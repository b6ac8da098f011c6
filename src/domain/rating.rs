/// Running rating aggregate as stored on vendors and products.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingAggregate {
    pub average: f64,
    pub count: i32,
}

/// Fold one score into the aggregate: `(avg * count + value) / (count + 1)`.
/// The stored average is kept at 2 decimals, matching its wire format.
pub fn fold(current: RatingAggregate, value: u8) -> RatingAggregate {
    let count = current.count + 1;
    let average = (current.average * current.count as f64 + value as f64) / count as f64;
    RatingAggregate {
        average: round2(average),
        count,
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incremental_mean() {
        let next = fold(
            RatingAggregate {
                average: 4.0,
                count: 3,
            },
            5,
        );
        assert_eq!(next.count, 4);
        assert_eq!(next.average, 4.25);
    }

    #[test]
    fn first_rating_sets_the_average() {
        let next = fold(
            RatingAggregate {
                average: 0.0,
                count: 0,
            },
            3,
        );
        assert_eq!(next.count, 1);
        assert_eq!(next.average, 3.0);
    }

    #[test]
    fn average_rounds_to_two_decimals() {
        // 5, then (5 + 4)/2 = 4.5, then (9 + 4)/3 = 4.333..
        let mut agg = RatingAggregate {
            average: 0.0,
            count: 0,
        };
        for value in [5, 4, 4] {
            agg = fold(agg, value);
        }
        assert_eq!(agg.count, 3);
        assert_eq!(agg.average, 4.33);
    }
}
