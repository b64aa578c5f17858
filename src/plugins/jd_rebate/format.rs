use super::client::ProductInfo;

/// 非空且不为 0
fn has_value(v: &str) -> bool {
    let v = v.trim();
    !v.is_empty() && !v.parse::<f64>().is_ok_and(|n| n == 0.0)
}

/// 构建转链文案
/// 空字段与 0 值字段不输出对应行
pub fn format_product(item: &ProductInfo, short_url: &str, show_commission: bool) -> String {
    let mut lines = vec![format!("📌 {}", item.title.trim())];

    let original = item.original_price.trim();
    let final_price = item.final_price.trim();
    if has_value(original) && has_value(final_price) && original != final_price {
        lines.push(format!("💰 原价: ¥{} 券后价: ¥{}", original, final_price));
    } else if has_value(final_price) {
        lines.push(format!("💰 价格: ¥{}", final_price));
    }

    if has_value(&item.coupon_info) {
        lines.push(format!("🎁 优惠: {}", item.coupon_info.trim()));
    } else if has_value(&item.coupon_amount) {
        lines.push(format!("🎁 优惠券: ¥{}", item.coupon_amount.trim()));
    }

    if show_commission && has_value(&item.commission) {
        lines.push(format!("💸 返利: ¥{}", item.commission.trim()));
    }

    lines.push(format!("👉 购买链接: {}", short_url));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> ProductInfo {
        ProductInfo {
            title: "T".into(),
            final_price: "99".into(),
            short_url: "https://u.jd.com/x".into(),
            ..Default::default()
        }
    }

    #[test]
    fn minimal_product() {
        assert_eq!(
            format_product(&item(), "https://u.jd.com/x", true),
            "📌 T\n💰 价格: ¥99\n👉 购买链接: https://u.jd.com/x"
        );
    }

    #[test]
    fn full_product() {
        let p = ProductInfo {
            original_price: "129".into(),
            coupon_info: "满99减30".into(),
            coupon_amount: "30".into(),
            commission: "4.5".into(),
            ..item()
        };
        assert_eq!(
            format_product(&p, "https://u.jd.com/x", true),
            "📌 T\n💰 原价: ¥129 券后价: ¥99\n🎁 优惠: 满99减30\n💸 返利: ¥4.5\n👉 购买链接: https://u.jd.com/x"
        );
    }

    #[test]
    fn equal_prices_collapse() {
        let p = ProductInfo {
            original_price: "99".into(),
            ..item()
        };
        assert!(format_product(&p, "l", true).contains("💰 价格: ¥99"));
    }

    #[test]
    fn coupon_amount_when_no_description() {
        let p = ProductInfo {
            coupon_amount: "20".into(),
            ..item()
        };
        assert!(format_product(&p, "l", true).contains("🎁 优惠券: ¥20"));

        let zero = ProductInfo {
            coupon_amount: "0".into(),
            ..item()
        };
        assert!(!format_product(&zero, "l", true).contains("🎁"));
    }

    #[test]
    fn commission_respects_toggle_and_zero() {
        let p = ProductInfo {
            commission: "3.2".into(),
            ..item()
        };
        assert!(format_product(&p, "l", true).contains("💸 返利: ¥3.2"));
        assert!(!format_product(&p, "l", false).contains("💸"));

        let zero = ProductInfo {
            commission: "0.00".into(),
            ..item()
        };
        assert!(!format_product(&zero, "l", true).contains("💸"));
    }

    #[test]
    fn no_price_line_without_price() {
        let p = ProductInfo {
            final_price: String::new(),
            ..item()
        };
        assert_eq!(format_product(&p, "l", true), "📌 T\n👉 购买链接: l");
    }
}
