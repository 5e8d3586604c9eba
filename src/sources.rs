/// Sitemap endpoints polled on every run. Each one is expected to be a
/// valid sitemap XML document reachable over HTTPS.
pub fn default_sitemaps() -> Vec<String> {
    [
        "https://www.lanazione.it/feedservice/sitemap/generic/lan/2025/day/sitemap.xml",
        "https://www.ilgiorno.it/feedservice/sitemap/generic/gio/2025/week/sitemap.xml",
        "https://www.ilrestodelcarlino.it/feedservice/sitemap/generic/rdc/2025/month/sitemap.xml",
        "https://www.quotidiano.net/feedservice/sitemap/generic/qn/2025/year/sitemap.xml",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Map a raw provenance tag to its canonical source label.
///
/// Exact-match only and case-sensitive; the empty tag means "web" and any
/// tag not in the table passes through unchanged.
pub fn normalize_source(source: &str) -> String {
    match source {
        "" => "web",
        "farmacie" => "MGC",
        "MIANEWS" => "web-collaboratori",
        "LAB" => "web-collaboratori",
        "DIRE" => "web-collaboratori",
        "ASKANEWS" => "web-collaboratori",
        "ANSA-MAR" => "web-collaboratori",
        "ANSA-OM" => "web-collaboratori",
        "ANSA-EMI" => "web-collaboratori",
        "ANSA-TOS" => "web-collaboratori",
        "AKS" => "web-collaboratori",
        "ANSA" => "web-collaboratori",
        "AGI" => "web-collaboratori",
        "9colonne" => "web-collaboratori",
        "adnmarche" => "web-collaboratori",
        "ITALPRESS" => "web-collaboratori",
        "ADN KRONOS" => "web-collaboratori",
        "tgr" => "web-collaboratori",
        "fromHermes" => "webcarta",
        "ULTIMORA_SPORT" => "agenzie-ansa",
        "ULTIMORA_ECONOMIA" => "agenzie-ansa",
        "ULTIMORA_NEWS" => "agenzie-ansa",
        "carta" => "carta",
        "aicarta" => "carta-opti",
        "aicarta-title" => "carta-opti-title",
        "aicarta-title-sum" => "arta-opti-title-som",
        "MGC" => "MGC",
        "COLLABORATORI" => "web-collaboratori",
        "Synch da Polopoly" => "webcarts-old",
        "Smart Holo" => "web-collaboratori",
        "migration" => "web",
        "santi" => "MGC",
        "oroscopo_barbanera" => "carta-opti-title-sum",
        "APUNTOWER" => "web-collaboratori",
        "AFFILIATION" => "branded",
        "EURACTIVE" => "web-collaboratori",
        "NOVA" => "web-collaboratori",
        other => other,
    }
    .to_string()
}
