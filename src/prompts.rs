// Prompt text for case review generation.
//
// The main template is rendered by `assembler::assemble_prompt`, which fills
// `{capabilities}` and `{case_description}`. Literal braces must be doubled.

pub const CAPABILITIES_PLACEHOLDER: &str = "capabilities";
pub const CASE_DESCRIPTION_PLACEHOLDER: &str = "case_description";

pub const JUSTIFICATION_INSTRUCTION: &str =
    "Justification [describe how your actions and approach link to the capability]:";

pub const PROMPT_TEMPLATE: &str = r#"
I am a GP Trainee. Write a clinical case review for my GP Portfolio based on the case description below. Please structure the response carefully with ALL of the following sections in order:

Brief Description:
[Provide a clear, structured 2-3 paragraph summary of the key points, clinical decisions, and outcomes]

{capabilities}

Reflection: What will I maintain, improve or stop?
[Reflect on:
What went well and why (to maintain these behaviors)
What could be improved in future similar cases
What should be stopped or done differently
Your emotional response to the case
As per RCGP guidance: "This reflection should include actions required in response to your emotional needs as well as clinical and educational actions i.e. 'how did it make you feel?'"]

Learning needs identified from this event:
[List specific learning needs, knowledge gaps, or skills to develop based on this case]

Here is the case to review:
{case_description}

Please ensure:
Each section is clearly labeled and populated
Use professional medical language throughout
Make specific, actionable points in the reflection and learning needs sections
Link capabilities to concrete actions and decisions from the case
Include emotional aspects in the reflection as per RCGP guidance
Do not use any special characters in the output at all. E.g no *,$,&,- etc.
"#;

pub const SYSTEM_PROMPT: &str = r#"
You are an AI assistant helping users with their GP training portfolio. Users will give case descriptions and you will help by generating text specifically based on the capabilities given and structured and to the same level of detail as the examples which will be provided.
Do not use any special characters in the output at all. E.g no *,$,&,- etc.
"#;

pub const TITLE_INSTRUCTION: &str =
    "Write a short, anonymised title of no more than eight words for this clinical case. Reply with the title only.";

/// Follow-up turn used when the user asks for a revised review.
pub fn improvement_request(feedback: &str) -> String {
    format!(
        "Please revise the case review above. Keep exactly the same section headings \
         (Brief Description, each Capability with its Justification, Reflection and \
         Learning needs identified from this event) and apply this feedback:\n{}",
        feedback.trim()
    )
}

pub const FEW_SHOT_CASE: &str = r#"A 58 year old man attended with three days of productive cough and fever. He had COPD and was a current smoker. Observations were stable with oxygen saturations of 95 percent. I examined his chest, found coarse crackles at the right base, and diagnosed an infective exacerbation. I prescribed a course of antibiotics and a short course of prednisolone, checked his inhaler technique, and discussed smoking cessation, which he was not ready to consider. I safety netted about breathlessness and arranged a review in one week."#;

pub const FEW_SHOT_REVIEW: &str = r#"Brief Description:
A 58 year old man with COPD presented with three days of productive cough and fever. He was systemically well with stable observations. Examination revealed coarse crackles at the right base consistent with an infective exacerbation of COPD.

I managed him in the community with antibiotics and a short course of oral steroids in line with local guidance. I used the opportunity to review his inhaler technique and to raise smoking cessation. I gave clear safety netting advice and booked a follow up appointment in one week.

Capability: Clinical management
Justification: I recognised an infective exacerbation of COPD and managed it safely in primary care following local guidance. I checked for drug interactions before prescribing, provided explicit safety netting about worsening breathlessness, and arranged follow up to ensure continuity of care.

Capability: Practising holistically, promoting health and safeguarding
Justification: I addressed the wider determinants of his lung health by reviewing inhaler technique and raising smoking cessation. I respected his decision not to stop smoking at this point and left the door open for future support.

Reflection: What will I maintain, improve or stop?
I will maintain my structured approach to assessing exacerbations and my habit of checking inhaler technique. I could improve how I explore readiness to change, perhaps using motivational interviewing techniques. I felt slightly frustrated that he declined smoking cessation support, and I recognise the importance of accepting patient autonomy while continuing to offer help.

Learning needs identified from this event:
Review current guidance on COPD exacerbation management and rescue packs.
Develop motivational interviewing skills for smoking cessation conversations."#;
