// =============================================================================
// Soy Risk Dashboard - Page
// =============================================================================
// Single static page: two multi-select dropdowns, a download link and the
// Plotly map. The script enforces the cascade order: a municipality change
// first replaces the company options and value, and only then redraws the
// map and the download link.
// =============================================================================

use axum::response::Html;

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub(crate) const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Soy deforestation risk</title>
<script src="https://cdn.plot.ly/plotly-2.27.0.min.js"></script>
<style>
  body { font-family: "DM Sans Medium", sans-serif; margin: 0 12px; }
  hr { border: 0; border-top: 1.5pt solid #FF6A5F; margin: 5px 0 0 0; }
  .card { background: linear-gradient(to bottom, #BBFFEC, #FFFFFF); padding: 20px; }
  .card-title { font-size: 24px; }
  .card-description { font-family: "DM Sans", sans-serif; font-size: 16px; }
  .row { display: flex; gap: 12px; }
  .row > div { width: 50%; }
  select { width: 100%; min-height: 6em; }
  #choropleth-graph { height: 700px; width: 100%; }
</style>
</head>
<body>
<hr>
<div class="card">
  <h2 class="card-title">Soy deforestation risk at asset level for storage facilities in Brazil</h2>
  <p class="card-description">
    Deforestation risk categorization of soy silos in Brazil for the year 2020, considering all
    silos presented in the Trase database (silos assigned to a given branch in Trase). The risk
    categorization is carried out in two steps: first, we identify municipalities more likely to
    provide production to a given silo based on transportation cost by road and branch assignment
    in Trase; secondly, we classify deforestation risk based on the risk status of each providing
    municipality and the respective soy volume produced by them. Areas 'at-risk' contribute to 95%
    of the national soy deforestation in 2020 (soy occupying areas deforested between 2015-2019).
    Click 'download' to access the original data for the selected area.
  </p>
</div>
<div class="row">
  <div>
    <label for="destination-mun-dropdown">Destination Municipality</label>
    <select id="destination-mun-dropdown" multiple></select>
  </div>
  <div>
    <label for="destination-company-dropdown">Destination Company</label>
    <select id="destination-company-dropdown" multiple></select>
  </div>
</div>
<div class="download_link">
  <div style="height: 5px"></div>
  <a id="download-link"><button>Download CSV</button></a>
</div>
<div id="choropleth-graph"></div>
<script>
const munSelect = document.getElementById("destination-mun-dropdown");
const companySelect = document.getElementById("destination-company-dropdown");
const downloadLink = document.getElementById("download-link");
// Only the newest redraw may touch the map and the link
let latestRedraw = 0;

function fill(select, state) {
  select.innerHTML = "";
  for (const opt of state.options) {
    const el = document.createElement("option");
    el.value = opt.value;
    el.textContent = opt.label;
    el.selected = state.value.includes(opt.value);
    select.appendChild(el);
  }
}

function selected(select) {
  return Array.from(select.selectedOptions, (o) => o.value);
}

async function post(url, body) {
  const res = await fetch(url, {
    method: "POST",
    headers: { "content-type": "application/json" },
    body: JSON.stringify(body),
  });
  if (!res.ok) throw new Error(url + ": " + res.status);
  return res.json();
}

async function redraw() {
  const seq = ++latestRedraw;
  const selection = {
    municipalities: selected(munSelect),
    companies: selected(companySelect),
  };
  const [figure, link] = await Promise.all([
    post("/api/figure", selection),
    post("/api/download", selection),
  ]);
  if (seq !== latestRedraw) return;
  Plotly.react("choropleth-graph", figure.data, figure.layout, { responsive: true });
  downloadLink.href = link.href;
  downloadLink.download = link.download;
}

let latestCompanies = 0;

async function municipalitiesChanged() {
  const seq = ++latestCompanies;
  const companies = await post("/api/companies", { municipalities: selected(munSelect) });
  if (seq !== latestCompanies) return;
  fill(companySelect, companies);
  await redraw();
}

munSelect.addEventListener("change", () => municipalitiesChanged().catch(console.error));
companySelect.addEventListener("change", () => redraw().catch(console.error));

fetch("/api/municipalities")
  .then((res) => res.json())
  .then((state) => {
    fill(munSelect, state);
    return municipalitiesChanged();
  })
  .catch(console.error);
</script>
</body>
</html>
"##;
