use rayon::prelude::*;

use gosoi::aggregate::{Aggregator, Bucket, DirectionCounts, Propagation};
use gosoi::annotations::{Annotation, AnnotationIndex, Gene, GeneId};
use gosoi::evidence::{EvidenceCode, EvidenceFilter, EvidenceGroup};
use gosoi::significance::{DecisionPolicy, DirectionScore, Evaluation, SoiScore, Verdict};
use gosoi::soi::{
    AnnotationDirection, Categories, Direction, DuplicatePolicy, GeneralDirectionPolicy, Soi,
    SoiAnnotation, SoiModel, SoiModelInput,
};
use gosoi::stats::{BackgroundCounts, ScoreInput, Scorer, StatTest};
use gosoi::{Category, Engine, GoGroup, GoTermId, GoTermRecord, Ontology, Settings};

fn bp(id: u32, name: &str) -> GoTermRecord {
    GoTermRecord::new(id, name, Category::BiologicalProcess)
}

fn single_soi(annotations: Vec<SoiAnnotation>, categories: Categories) -> SoiModelInput {
    SoiModelInput {
        sois: vec![Soi::new("X", Direction::Up)],
        annotations,
        categories,
    }
}

/// A <- B <- C
fn chain() -> Ontology {
    Ontology::from_records(vec![
        bp(1, "A"),
        bp(2, "B").with_parent(1u32),
        bp(3, "C").with_parent(2u32),
    ])
    .unwrap()
}

#[test]
fn chain_credits_every_term_once() {
    let ontology = chain();
    let model = SoiModel::new(
        single_soi(
            vec![
                SoiAnnotation::new(1u32, "X", AnnotationDirection::Up, 1.0),
                SoiAnnotation::new(2u32, "X", AnnotationDirection::Up, 1.0),
                SoiAnnotation::new(3u32, "X", AnnotationDirection::Up, 1.0),
            ],
            Categories::default(),
        ),
        &ontology,
        DuplicatePolicy::Max,
        GeneralDirectionPolicy::Exclude,
    )
    .unwrap();
    let index = AnnotationIndex::from_annotations(
        vec![Annotation::new("g", 3u32, "IDA")],
        &EvidenceFilter::accept_all(),
    );
    let gene = index.gene(&GeneId::from("g")).unwrap();

    let aggregator = Aggregator::new(&ontology, &model, Propagation::default());
    let hits = aggregator.gene_hits(gene);
    let credited: Vec<u32> = hits.all().iter().map(|id| id.as_u32()).collect();
    assert_eq!(credited, vec![1, 2, 3]);
    assert_eq!(hits.direct().len(), 1);
    assert_eq!(hits.indirect().len(), 2);

    let counts = aggregator.annotation_counts(gene, model.soi("X").unwrap());
    assert_eq!(counts.up.direct, Bucket { count: 1, weight: 1.0 });
    assert_eq!(counts.up.indirect, Bucket { count: 2, weight: 2.0 });
}

#[test]
fn transitive_closure_is_idempotent() {
    let ontology = Ontology::from_records(vec![
        bp(1, "root"),
        bp(2, "a").with_parent(1u32),
        bp(3, "b").with_parent(1u32),
        bp(4, "c").with_parent(2u32).with_parent(3u32),
        bp(5, "d").with_parent(4u32),
        bp(6, "e").with_parent(5u32).with_parent(2u32),
    ])
    .unwrap();

    for term in ontology.terms() {
        let ancestors = term.ancestor_ids();
        for ancestor in ancestors {
            let transitive = ontology.ancestors(ancestor).unwrap();
            assert!(
                transitive.iter().all(|id| ancestors.contains(&id)),
                "ancestors of {} are not closed",
                term.id()
            );
        }
    }
}

#[test]
fn deduplicated_count_is_at_most_naive_count() {
    // 1 is reachable from 4 through 2 and 3, and from 5 through 3
    let ontology = Ontology::from_records(vec![
        bp(1, "root"),
        bp(2, "a").with_parent(1u32),
        bp(3, "b").with_parent(1u32),
        bp(4, "c").with_parent(2u32).with_parent(3u32),
        bp(5, "d").with_parent(3u32),
    ])
    .unwrap();
    let annotations = (1u32..=5)
        .map(|id| SoiAnnotation::new(id, "X", AnnotationDirection::Up, 1.0))
        .collect();
    let model = SoiModel::new(
        single_soi(annotations, Categories::default()),
        &ontology,
        DuplicatePolicy::Max,
        GeneralDirectionPolicy::Exclude,
    )
    .unwrap();
    let index = AnnotationIndex::from_annotations(
        vec![
            Annotation::new("g", 4u32, "IDA"),
            Annotation::new("g", 5u32, "IMP"),
        ],
        &EvidenceFilter::accept_all(),
    );
    let gene = index.gene(&GeneId::from("g")).unwrap();
    let soi = model.soi("X").unwrap();
    let target = soi.bucket(Direction::Up).terms();

    // every direct term plus every one of its ancestors, without merging
    let naive: usize = gene
        .go_terms()
        .iter()
        .map(|id| {
            let expanded = ontology.ancestors(id).unwrap();
            usize::from(target.contains(&id))
                + expanded.iter().filter(|term| target.contains(term)).count()
        })
        .sum();

    let counts = Aggregator::new(&ontology, &model, Propagation::default())
        .annotation_counts(gene, soi);
    assert_eq!(naive, 7);
    assert_eq!(counts.up.total().count, 5);
    assert!(counts.up.total().count <= naive);
}

#[test]
fn fisher_is_monotonic_in_direct_hits() {
    let background = BackgroundCounts {
        target: 20,
        total: 220,
    };
    let pvalues: Vec<f64> = (0..=10)
        .map(|direct| {
            let counts = DirectionCounts {
                direct: Bucket { count: direct, weight: 0.0 },
                indirect: Bucket::default(),
            };
            let input = ScoreInput::new(counts, 10.0, 10, background);
            StatTest::Fisher.calculate(&input)
        })
        .collect();

    assert_eq!(pvalues[0], 1.0);
    for pair in pvalues.windows(2) {
        assert!(pair[1] <= pair[0], "{} > {}", pair[1], pair[0]);
    }
    assert!(pvalues[10] < 1e-6);
}

fn scored(model: &SoiModel, up: f64, down: f64) -> Evaluation<gosoi::significance::Evaluated> {
    let soi = model.soi("X").unwrap();
    let direction = |pvalue: f64| {
        let mut score = DirectionScore::new(DirectionCounts::default(), false);
        score.insert(StatTest::Fisher, pvalue);
        score
    };
    let mut evaluation = Evaluation::new(GeneId::from("g"), false);
    evaluation.add_score(SoiScore::new(soi, direction(up), direction(down)));
    evaluation.evaluate(model.sois()).unwrap()
}

#[test]
fn opposite_direction_policy() {
    let ontology = chain();
    let model = SoiModel::new(
        single_soi(
            vec![
                SoiAnnotation::new(2u32, "X", AnnotationDirection::Up, 1.0),
                SoiAnnotation::new(3u32, "X", AnnotationDirection::Down, 1.0),
            ],
            Categories::default(),
        ),
        &ontology,
        DuplicatePolicy::Max,
        GeneralDirectionPolicy::Exclude,
    )
    .unwrap();
    let default = DecisionPolicy::default();
    let exclude = DecisionPolicy {
        exclude_opposite: true,
        ..Default::default()
    };

    // g1
    assert_eq!(scored(&model, 0.01, 0.5).decide(&default).verdict(), Verdict::Significant);
    // g2
    assert_eq!(
        scored(&model, 0.01, 0.01).decide(&default).verdict(),
        Verdict::NotSignificant
    );
    assert_eq!(scored(&model, 0.01, 0.01).decide(&exclude).verdict(), Verdict::Significant);
}

/// ```text
///            1
///   /   /    |    \    \
///  2   3     4     5    6
/// (+) (+)   (-)   (-)  (0)
/// ```
///
/// `g1` hits both `+` terms, `g2` hits all `+` and `-` terms and 100
/// filler genes only hit the general term.
fn regulation_data() -> (Ontology, AnnotationIndex, SoiModelInput) {
    let ontology = Ontology::from_records(vec![
        bp(1, "root"),
        bp(2, "positive regulation").with_parent(1u32),
        bp(3, "positive regulation").with_parent(1u32),
        bp(4, "negative regulation").with_parent(1u32),
        bp(5, "negative regulation").with_parent(1u32),
        bp(6, "regulation").with_parent(1u32),
    ])
    .unwrap();

    let mut annotations = vec![
        Annotation::new("g1", 2u32, "IDA"),
        Annotation::new("g1", 3u32, "IMP"),
        Annotation::new("g2", 2u32, "IDA"),
        Annotation::new("g2", 3u32, "IDA"),
        Annotation::new("g2", 4u32, "IGI"),
        Annotation::new("g2", 5u32, "IGI"),
    ];
    for idx in 0..100 {
        annotations.push(Annotation::new(format!("filler{idx:03}"), 6u32, "IBA"));
    }
    let index =
        AnnotationIndex::from_annotations(annotations, &Settings::default().evidence_filter().unwrap());

    let input = single_soi(
        vec![
            SoiAnnotation::new(2u32, "X", AnnotationDirection::Up, 1.0),
            SoiAnnotation::new(3u32, "X", AnnotationDirection::Up, 1.0),
            SoiAnnotation::new(4u32, "X", AnnotationDirection::Down, 1.0),
            SoiAnnotation::new(5u32, "X", AnnotationDirection::Down, 1.0),
            SoiAnnotation::new(6u32, "X", AnnotationDirection::General, 1.0),
        ],
        Categories::default(),
    );
    (ontology, index, input)
}

#[test]
fn opposite_direction_end_to_end() {
    let (ontology, index, input) = regulation_data();

    let engine = Engine::new(&ontology, &index, input.clone(), &Settings::default()).unwrap();
    let table = engine.score_all();
    assert_eq!(table.len(), 102);

    let g1 = table.get(&GeneId::from("g1")).unwrap();
    assert_eq!(g1.verdict(), Verdict::Significant);
    let g2 = table.get(&GeneId::from("g2")).unwrap();
    let score = g2.score("X").unwrap();
    assert!(score.get(Direction::Up).get(StatTest::Fisher).unwrap() < 0.05);
    assert!(score.get(Direction::Down).get(StatTest::Fisher).unwrap() < 0.05);
    assert_eq!(g2.verdict(), Verdict::NotSignificant);
    assert_eq!(table.significant().count(), 1);

    let settings = Settings {
        exclude_opposite_regulation_direction_check: true,
        ..Default::default()
    };
    let engine = Engine::new(&ontology, &index, input, &settings).unwrap();
    let genes = [GeneId::from("g1"), GeneId::from("g2"), GeneId::from("filler000")];
    let table = engine.score_genes(&genes);
    let significant: Vec<&str> = table
        .significant()
        .map(|result| result.gene().as_str())
        .collect();
    assert_eq!(significant, vec!["g1", "g2"]);
    assert!(table.get(&GeneId::from("filler000")).unwrap().missing_annotation_data());
}

/// Terms 2 and 3 are the only `+` terms of the SOI, terms 10 to 50 are not
/// part of the model at all. `g1` hits both `+` terms, `broad` hits term 2
/// and every term outside of the model, `specific` hits term 2 only and
/// 200 filler genes hit a single term outside of the model.
fn single_direction_data() -> (Ontology, AnnotationIndex, SoiModelInput) {
    let mut records = vec![
        bp(1, "root"),
        bp(2, "positive regulation").with_parent(1u32),
        bp(3, "positive regulation").with_parent(1u32),
    ];
    records.extend((10u32..=50).map(|id| bp(id, "unrelated").with_parent(1u32)));
    let ontology = Ontology::from_records(records).unwrap();

    let mut annotations = vec![
        Annotation::new("g1", 2u32, "IDA"),
        Annotation::new("g1", 3u32, "IMP"),
        Annotation::new("broad", 2u32, "IDA"),
        Annotation::new("specific", 2u32, "IDA"),
    ];
    annotations.extend((10u32..=50).map(|id| Annotation::new("broad", id, "IMP")));
    for idx in 0..200u32 {
        annotations.push(Annotation::new(format!("filler{idx:03}"), 10 + idx % 41, "IBA"));
    }
    let index =
        AnnotationIndex::from_annotations(annotations, &Settings::default().evidence_filter().unwrap());

    let input = single_soi(
        vec![
            SoiAnnotation::new(2u32, "X", AnnotationDirection::Up, 1.0),
            SoiAnnotation::new(3u32, "X", AnnotationDirection::Up, 1.0),
        ],
        Categories::default(),
    );
    (ontology, index, input)
}

#[test]
fn single_direction_model_is_enriched() {
    let (ontology, index, input) = single_direction_data();
    let engine = Engine::new(&ontology, &index, input, &Settings::default()).unwrap();
    let table = engine.score_all();
    assert_eq!(table.len(), 203);

    // the population hits 448 terms, 4 of them `+` terms
    let g1 = table.get(&GeneId::from("g1")).unwrap();
    let up = g1.score("X").unwrap().get(Direction::Up);
    let fisher = up.get(StatTest::Fisher).unwrap();
    assert!((fisher - gosoi::stats::fisher_exact(2, 1, 2, 443)).abs() < 1e-12);
    assert!(fisher < 0.05, "{fisher}");
    assert!(up.get(StatTest::Binomial).unwrap() < 0.05);
    assert!(g1.score("X").unwrap().get(Direction::Down).empty_background());
    assert_eq!(g1.verdict(), Verdict::Significant);

    let broad = table.get(&GeneId::from("broad")).unwrap();
    let specific = table.get(&GeneId::from("specific")).unwrap();
    let broad_up = broad.score("X").unwrap().get(Direction::Up);
    let specific_up = specific.score("X").unwrap().get(Direction::Up);
    for test in [StatTest::Fisher, StatTest::Binomial] {
        let broad_pvalue = broad_up.get(test).unwrap();
        assert!(broad_pvalue > specific_up.get(test).unwrap(), "{test:?}");
        assert!(broad_pvalue > fisher, "{test:?}");
        assert!(broad_pvalue > 0.05, "{test:?}");
    }
    assert_eq!(broad.verdict(), Verdict::NotSignificant);
    // both genes hit term 2 only, the counting scores cannot tell them apart
    assert_eq!(broad_up.get(StatTest::NTerms), specific_up.get(StatTest::NTerms));

    assert!(table.get(&GeneId::from("filler000")).unwrap().missing_annotation_data());
}

#[test]
fn evidence_expression() {
    let filter = EvidenceFilter::from_expression("experimental(~),!curator_statement(ND)").unwrap();
    for code in EvidenceGroup::Experimental.codes() {
        assert!(filter.accepts(*code), "{code}");
    }
    assert!(!filter.accepts(EvidenceCode::Nd));
    assert!(filter.accepts(EvidenceCode::Ic));
}

#[test]
fn disabled_category_is_never_counted() {
    let ontology = Ontology::from_records(vec![
        bp(1, "process"),
        GoTermRecord::new(10u32, "compartment", Category::CellularComponent),
        GoTermRecord::new(11u32, "organelle", Category::CellularComponent).with_parent(10u32),
    ])
    .unwrap();
    let index = AnnotationIndex::from_annotations(
        vec![
            Annotation::new("g", 11u32, "IDA"),
            Annotation::new("g", 1u32, "IDA"),
        ],
        &EvidenceFilter::accept_all(),
    );
    let annotations = vec![
        SoiAnnotation::new(1u32, "X", AnnotationDirection::Up, 1.0),
        SoiAnnotation::new(10u32, "X", AnnotationDirection::Up, 1.0),
        SoiAnnotation::new(11u32, "X", AnnotationDirection::Up, 1.0),
    ];
    let categories = Categories {
        cellular_component: false,
        ..Categories::all()
    };

    let engine = Engine::new(
        &ontology,
        &index,
        single_soi(annotations, categories),
        &Settings::default(),
    )
    .unwrap();
    let gene = index.gene(&GeneId::from("g")).unwrap();
    let record = engine.gene_record(gene);

    let disabled: GoGroup = [10u32, 11].into_iter().map(GoTermId::from).collect();
    assert!((&record.hits().all() & &disabled).is_empty());
    assert!(!engine.model().universe().contains(&10u32.into()));
    assert_eq!(record.counts("X").unwrap().up.total().count, 1);
}

#[test]
fn parallel_scoring_matches_serial() {
    let (ontology, index, input) = regulation_data();
    let engine = Engine::new(&ontology, &index, input, &Settings::default()).unwrap();

    let serial = engine.score_all();
    let genes: Vec<&Gene> = index.genes().collect();
    let parallel: Vec<_> = genes.par_iter().map(|gene| engine.score_gene(gene)).collect();

    assert_eq!(parallel.len(), serial.len());
    for result in &parallel {
        assert_eq!(Some(result), serial.get(result.gene()));
    }
}
