// words.rs
// pt-BR amount in words for receipts ("Cento e cinquenta reais e vinte centavos").

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};

const UNITS: [&str; 20] = [
    "zero", "um", "dois", "três", "quatro", "cinco", "seis", "sete", "oito", "nove", "dez",
    "onze", "doze", "treze", "catorze", "quinze", "dezesseis", "dezessete", "dezoito", "dezenove",
];

const TENS: [&str; 10] = [
    "", "", "vinte", "trinta", "quarenta", "cinquenta", "sessenta", "setenta", "oitenta",
    "noventa",
];

const HUNDREDS: [&str; 10] = [
    "", "cento", "duzentos", "trezentos", "quatrocentos", "quinhentos", "seiscentos",
    "setecentos", "oitocentos", "novecentos",
];

// (singular, plural) for each group of three digits above the units group.
const SCALES: [(&str, &str); 4] = [
    ("mil", "mil"),
    ("milhão", "milhões"),
    ("bilhão", "bilhões"),
    ("trilhão", "trilhões"),
];

fn below_thousand(n: u64) -> String {
    debug_assert!(n < 1000);
    if n == 100 {
        return "cem".to_string();
    }
    let mut parts = Vec::new();
    let hundreds = (n / 100) as usize;
    let rest = n % 100;
    if hundreds > 0 {
        parts.push(HUNDREDS[hundreds].to_string());
    }
    if rest > 0 {
        if rest < 20 {
            parts.push(UNITS[rest as usize].to_string());
        } else {
            parts.push(TENS[(rest / 10) as usize].to_string());
            if rest % 10 > 0 {
                parts.push(UNITS[(rest % 10) as usize].to_string());
            }
        }
    }
    parts.join(" e ")
}

/// Cardinal number in pt-BR words.
pub fn number_in_words(n: u64) -> String {
    if n == 0 {
        return UNITS[0].to_string();
    }

    let mut groups = Vec::new();
    let mut rest = n;
    while rest > 0 {
        groups.push(rest % 1000);
        rest /= 1000;
    }

    // (scale position, group value) from the highest group down, zeros skipped
    let spoken: Vec<(usize, u64)> = groups
        .iter()
        .enumerate()
        .rev()
        .filter(|(_, g)| **g > 0)
        .map(|(pos, g)| (pos, *g))
        .collect();

    let mut out = String::new();
    for (i, (pos, group)) in spoken.iter().enumerate() {
        let text = match (*pos, *group) {
            (0, g) => below_thousand(g),
            (1, 1) => "mil".to_string(),
            (p, 1) => format!("um {}", scale_name(p, false)),
            (p, g) => format!("{} {}", below_thousand(g), scale_name(p, true)),
        };
        if i > 0 {
            let is_last = i == spoken.len() - 1;
            if is_last && (*group < 100 || *group % 100 == 0) {
                out.push_str(" e ");
            } else {
                out.push(' ');
            }
        }
        out.push_str(&text);
    }
    out
}

fn scale_name(pos: usize, plural: bool) -> &'static str {
    let (singular, many) = SCALES
        .get(pos.saturating_sub(1))
        .copied()
        .unwrap_or(("quatrilhão", "quatrilhões"));
    if plural { many } else { singular }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Amount in reais and centavos, capitalized, rounded to the cent.
pub fn amount_in_words(amount: Decimal) -> String {
    let rounded = amount
        .abs()
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let reais = rounded.trunc().to_u64().unwrap_or_default();
    let centavos = (rounded.fract() * Decimal::ONE_HUNDRED)
        .trunc()
        .to_u64()
        .unwrap_or_default();

    let reais_text = {
        let unit = if reais == 1 { "real" } else { "reais" };
        let joiner = if reais >= 1_000_000 && reais % 1_000_000 == 0 {
            " de "
        } else {
            " "
        };
        format!("{}{}{}", number_in_words(reais), joiner, unit)
    };
    let centavos_text = format!(
        "{} {}",
        number_in_words(centavos),
        if centavos == 1 { "centavo" } else { "centavos" }
    );

    let text = match (reais, centavos) {
        (_, 0) => reais_text,
        (0, _) => centavos_text,
        _ => format!("{reais_text} e {centavos_text}"),
    };
    capitalize(&text)
}
