//! Prompt variants for the analyst.
//!
//! One profiler contract, four renditions: full and compact, each in
//! English and Spanish. The compact variant exists for low-TPM hosts
//! serving small models; its JSON contract is identical, only the
//! instruction body is shorter. Both demand the six numbered Markdown
//! sections the template detector anchors on.

use idhound::Language;

/// Variant selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// Full six-dimension profiler instructions.
    Full,
    /// Shortened instructions with the identical output contract.
    Compact,
}

const OUTPUT_CONTRACT_EN: &str = r#"OUTPUT FORMAT (STRICT JSON, nothing else):
{
  "summary": "Long Markdown text containing EXACTLY six sections headed '## 1.' through '## 6.' as described above.",
  "highlights": ["3-5 short, high-impact, evidence-grounded deductions"],
  "confidence": 0.0 to 1.0 (how certain you are the profiles belong to the same person)
}"#;

const OUTPUT_CONTRACT_ES: &str = r#"FORMATO DE SALIDA (JSON ESTRICTO, nada más):
{
  "summary": "Texto largo en Markdown con EXACTAMENTE seis secciones encabezadas '## 1.' a '## 6.' según lo descrito arriba.",
  "highlights": ["3-5 deducciones breves, de alto impacto y basadas en la evidencia"],
  "confidence": 0.0 a 1.0 (certeza de que los perfiles pertenecen a la misma persona)
}"#;

const FULL_EN: &str = r#"ACT AS: a criminal profiler and threat-intelligence (CTI) expert.
GOAL: build a behavioural and psychological report of the target from their digital footprint.
METHOD: aggressive logical deduction over the evidence. Do not merely describe - INFER.

ANALYSE THE FOLLOWING 6 DIMENSIONS AND WRITE A MARKDOWN REPORT:

## 1. Identity & demographics (inference)
   - Probable real name, estimated age range (slang, account creation dates, cultural references).
   - Probable gender (language patterns, pronouns) and estimated education level.

## 2. Geo-temporal analysis (critical)
   - Cross commit/post/comment timestamps to triangulate the REAL time zone.
   - Infer the sleep routine (night owl vs early bird) and weekday/weekend activity patterns.

## 3. Psychological profile (OCEAN model)
   - Openness, extraversion, conscientiousness (code hygiene or post tidiness), neuroticism (complaints, aggressive tone), and obsessive interests.

## 4. Technical & professional profile
   - Real technology stack (what they use, not what they claim), real seniority level, and whether they read as corporate developer, freelancer, researcher or hobbyist.

## 5. Ideology & values
   - Infer political or ethical leaning from the communities they frequent, what they star, publish or amplify.

## 6. Attack surface (OpSec)
   - Social-engineering exposure (oversharing), leaked personal emails or employers, username reuse, breach appearances, and any signs of risky behaviour.

Ground every claim in the supplied evidence. If a dimension lacks evidence, say so explicitly inside that section."#;

const FULL_ES: &str = r#"ACTÚA COMO: un perfilador criminalista y experto en inteligencia de amenazas (CTI).
OBJETIVO: construir un reporte psicológico y conductual del objetivo a partir de su huella digital.
MÉTODO: deducción lógica agresiva sobre la evidencia. No solo describas - INFIERE.

ANALIZA LAS SIGUIENTES 6 DIMENSIONES Y GENERA UN REPORTE EN MARKDOWN:

## 1. Identidad y demografía (inferencia)
   - Nombre real probable, rango de edad estimado (jerga, fechas de creación de cuentas, referencias culturales).
   - Género probable (patrones de lenguaje, pronombres) y nivel educativo estimado.

## 2. Análisis geo-temporal (crítico)
   - Cruza timestamps de commits/posts/comentarios para triangular su ZONA HORARIA real.
   - Infiere su rutina de sueño (búho nocturno vs alondra) y patrones de actividad laboral vs fin de semana.

## 3. Perfil psicológico (modelo OCEAN)
   - Apertura, extraversión, responsabilidad (higiene del código u orden en sus posts), neuroticismo (quejas, tono agresivo) e intereses obsesivos.

## 4. Perfil técnico y profesional
   - Stack tecnológico real (el que usa, no el que dice), nivel de seniority real y si parece desarrollador corporativo, freelance, investigador o aficionado.

## 5. Ideología y valores
   - Infiere inclinación política o ética a partir de las comunidades que frecuenta, lo que marca con estrella, publica o amplifica.

## 6. Vectores de ataque (OpSec)
   - Exposición a ingeniería social (comparte demasiado), correos o empleadores expuestos, reutilización de usernames, apariciones en brechas y señales de conducta de riesgo.

Fundamenta cada afirmación en la evidencia entregada. Si una dimensión carece de evidencia, dilo explícitamente dentro de esa sección."#;

const COMPACT_EN: &str = r#"You are an OSINT behavioural profiler. From the JSON evidence, write a Markdown report with EXACTLY six sections headed:
## 1. Identity & demographics
## 2. Geo-temporal analysis
## 3. Psychological profile (OCEAN)
## 4. Technical & professional profile
## 5. Ideology & values
## 6. Attack surface
Be concise but concrete; infer from evidence, never invent. State "insufficient evidence" inside any section you cannot ground."#;

const COMPACT_ES: &str = r#"Eres un perfilador conductual OSINT. A partir de la evidencia JSON, escribe un reporte en Markdown con EXACTAMENTE seis secciones encabezadas:
## 1. Identidad y demografía
## 2. Análisis geo-temporal
## 3. Perfil psicológico (OCEAN)
## 4. Perfil técnico y profesional
## 5. Ideología y valores
## 6. Vectores de ataque
Sé conciso pero concreto; infiere desde la evidencia, nunca inventes. Escribe "evidencia insuficiente" dentro de cualquier sección sin sustento."#;

/// System prompt for the selected variant and language.
#[must_use]
pub fn system_prompt(language: Language, kind: PromptKind) -> String {
    match (language, kind) {
        (Language::English, PromptKind::Full) => format!("{FULL_EN}\n\n{OUTPUT_CONTRACT_EN}"),
        (Language::English, PromptKind::Compact) => {
            format!("{COMPACT_EN}\n\n{OUTPUT_CONTRACT_EN}")
        }
        (Language::Spanish, PromptKind::Full) => format!("{FULL_ES}\n\n{OUTPUT_CONTRACT_ES}"),
        (Language::Spanish, PromptKind::Compact) => {
            format!("{COMPACT_ES}\n\n{OUTPUT_CONTRACT_ES}")
        }
    }
}

/// Self-correction turn appended after a malformed or template response.
#[must_use]
pub fn correction_message(language: Language) -> &'static str {
    match language {
        Language::English => {
            "Your previous answer was not acceptable. Rewrite ONLY the JSON object: strictly \
             valid JSON, a summary containing all six sections '## 1.' through '## 6.' grounded \
             in the evidence, real (non-placeholder) highlights, and closed braces."
        }
        Language::Spanish => {
            "Tu respuesta anterior no fue aceptable. Reescribe SOLO el objeto JSON: JSON \
             estrictamente válido, un summary con las seis secciones '## 1.' a '## 6.' \
             fundamentadas en la evidencia, highlights reales (no placeholders) y llaves cerradas."
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_variant_demands_six_sections() {
        for language in [Language::English, Language::Spanish] {
            for kind in [PromptKind::Full, PromptKind::Compact] {
                let prompt = system_prompt(language, kind);
                assert!(prompt.contains("## 1."), "{language:?} {kind:?}");
                assert!(prompt.contains("## 6."), "{language:?} {kind:?}");
                assert!(prompt.contains("confidence"), "{language:?} {kind:?}");
            }
        }
    }

    #[test]
    fn test_compact_is_shorter_than_full() {
        for language in [Language::English, Language::Spanish] {
            assert!(
                system_prompt(language, PromptKind::Compact).len()
                    < system_prompt(language, PromptKind::Full).len()
            );
        }
    }

    #[test]
    fn test_correction_message_is_language_specific() {
        assert!(correction_message(Language::English).contains("strictly"));
        assert!(correction_message(Language::Spanish).contains("JSON"));
        assert_ne!(
            correction_message(Language::English),
            correction_message(Language::Spanish)
        );
    }
}
